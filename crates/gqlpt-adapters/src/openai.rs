use std::time::Duration;

use async_trait::async_trait;
use gqlpt::{Adapter, AdapterError, AdapterResponse, Conversation, Message, Role};
use serde::{Deserialize, Serialize};

use crate::http;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo-1106";

#[derive(Debug, Clone)]
pub struct OpenAiOptions {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl OpenAiOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_owned(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_owned(),
            max_tokens: None,
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Chat completions of the OpenAI API, in JSON mode.
pub struct OpenAiAdapter {
    options: OpenAiOptions,
    client: reqwest::Client,
}

impl OpenAiAdapter {
    pub fn new(options: OpenAiOptions) -> Result<Self, AdapterError> {
        let client = http::client(options.timeout)?;

        Ok(Self { options, client })
    }

    async fn complete(&self, messages: &[Message], json_mode: bool) -> Result<ChatResponse, AdapterError> {
        let url = format!("{}/chat/completions", http::trimmed_base_url(&self.options.base_url));

        let request = ChatRequest {
            model: &self.options.model,
            messages,
            max_tokens: self.options.max_tokens,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        let builder = self.client.post(url).bearer_auth(&self.options.api_key);

        http::post_json(builder, &request).await
    }
}

#[async_trait]
impl Adapter for OpenAiAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        let messages = [
            Message::user("When I say Ping, return exactly Pong"),
            Message::user("Ping"),
        ];

        let response = self.complete(&messages, false).await?;

        match response.content() {
            Some(content) if content.trim() == "Pong" => Ok(()),
            _ => Err(AdapterError::Handshake(String::from("OpenAI"))),
        }
    }

    async fn send_text(&self, text: &str, conversation: Option<&Conversation>) -> Result<AdapterResponse, AdapterError> {
        let mut messages = conversation.map(|conversation| conversation.messages().to_vec()).unwrap_or_default();
        messages.push(Message::user(text));

        tracing::debug!(model = %self.options.model, messages = messages.len(), "sending to OpenAI");

        let response = self.complete(&messages, true).await?;

        let content = response
            .content()
            .ok_or_else(|| AdapterError::InvalidResponse(String::from("no message in the completion")))?
            .to_owned();

        let conversation = conversation
            .cloned()
            .unwrap_or_else(|| Conversation::new(response.id))
            .with_exchange(text, &content);

        Ok(AdapterResponse { content, conversation })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    id: String,
    choices: Vec<Choice>,
}

impl ChatResponse {
    fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .filter(|choice| choice.message.role == Role::Assistant)
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    role: Role,
    content: Option<String>,
}
