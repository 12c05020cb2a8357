use std::time::Duration;

use async_trait::async_trait;
use gqlpt::{Adapter, AdapterError, AdapterResponse, Conversation, Message};
use serde::{Deserialize, Serialize};

use crate::http;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20240620";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const HANDSHAKE_SYSTEM_PROMPT: &str =
    "You are to test the connection to the Anthropic API. Respond with 'Pong' when you see 'Ping'.";

#[derive(Debug, Clone)]
pub struct AnthropicOptions {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AnthropicOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_ANTHROPIC_MODEL.to_owned(),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_owned(),
            max_tokens: 1024,
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
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The Anthropic messages API.
pub struct AnthropicAdapter {
    options: AnthropicOptions,
    client: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(options: AnthropicOptions) -> Result<Self, AdapterError> {
        let client = http::client(options.timeout)?;

        Ok(Self { options, client })
    }

    async fn create_message(&self, system: Option<&str>, messages: &[Message]) -> Result<MessagesResponse, AdapterError> {
        let url = format!("{}/messages", http::trimmed_base_url(&self.options.base_url));

        let request = MessagesRequest {
            model: &self.options.model,
            max_tokens: self.options.max_tokens,
            system,
            messages,
        };

        let builder = self
            .client
            .post(url)
            .header("x-api-key", &self.options.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);

        http::post_json(builder, &request).await
    }
}

#[async_trait]
impl Adapter for AnthropicAdapter {
    async fn connect(&self) -> Result<(), AdapterError> {
        let response = self
            .create_message(Some(HANDSHAKE_SYSTEM_PROMPT), &[Message::user("Ping")])
            .await?;

        match response.text() {
            Some(text) if text.trim() == "Pong" => Ok(()),
            _ => Err(AdapterError::Handshake(String::from("Anthropic"))),
        }
    }

    async fn send_text(&self, text: &str, conversation: Option<&Conversation>) -> Result<AdapterResponse, AdapterError> {
        let mut messages = conversation.map(|conversation| conversation.messages().to_vec()).unwrap_or_default();
        messages.push(Message::user(text));

        tracing::debug!(model = %self.options.model, messages = messages.len(), "sending to Anthropic");

        let response = self.create_message(None, &messages).await?;

        let content = response
            .text()
            .ok_or_else(|| AdapterError::InvalidResponse(String::from("no text block in the message")))?
            .to_owned();

        let conversation = conversation
            .cloned()
            .unwrap_or_else(|| Conversation::new(response.id))
            .with_exchange(text, &content);

        Ok(AdapterResponse { content, conversation })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    id: String,
    content: Vec<ContentBlock>,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
