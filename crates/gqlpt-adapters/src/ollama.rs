use std::time::Duration;

use async_trait::async_trait;
use gqlpt::{Adapter, AdapterError, AdapterResponse, Conversation, Message, Role};
use serde::{Deserialize, Serialize};

use crate::http;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";

const SYSTEM_PROMPT: &str = "You are a helpful GraphQL query generator assistant.";

#[derive(Debug, Clone)]
pub struct OllamaOptions {
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OllamaOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_OLLAMA_MODEL.to_owned(),
            base_url: DEFAULT_OLLAMA_BASE_URL.to_owned(),
            // local models are slow to answer on a cold start
            timeout: Duration::from_secs(120),
        }
    }
}

impl OllamaOptions {
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
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A model served by a local Ollama instance.
pub struct OllamaAdapter {
    options: OllamaOptions,
    client: reqwest::Client,
}

impl OllamaAdapter {
    pub fn new(options: OllamaOptions) -> Result<Self, AdapterError> {
        let client = http::client(options.timeout)?;

        Ok(Self { options, client })
    }
}

#[async_trait]
impl Adapter for OllamaAdapter {
    /// Lists the local models and checks the configured one is among them.
    async fn connect(&self) -> Result<(), AdapterError> {
        let url = format!("{}/api/tags", http::trimmed_base_url(&self.options.base_url));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|_| AdapterError::Handshake(String::from("Ollama")))?;

        if !response.status().is_success() {
            return Err(AdapterError::Handshake(String::from("Ollama")));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|err| AdapterError::InvalidResponse(err.to_string()))?;

        // `llama2` matches the `llama2:latest` tag
        let found = tags.models.iter().any(|model| {
            model.name == self.options.model || model.name.split(':').next() == Some(self.options.model.as_str())
        });

        if !found {
            tracing::warn!(model = %self.options.model, "model is not pulled on the Ollama instance");
            return Err(AdapterError::Handshake(format!("Ollama model {}", self.options.model)));
        }

        Ok(())
    }

    async fn send_text(&self, text: &str, conversation: Option<&Conversation>) -> Result<AdapterResponse, AdapterError> {
        let system = Message {
            role: Role::System,
            content: SYSTEM_PROMPT.to_owned(),
        };

        let mut messages = vec![system];
        messages.extend(conversation.map(|conversation| conversation.messages().to_vec()).unwrap_or_default());
        messages.push(Message::user(text));

        tracing::debug!(model = %self.options.model, messages = messages.len(), "sending to Ollama");

        let url = format!("{}/api/chat", http::trimmed_base_url(&self.options.base_url));
        let request = ChatRequest {
            model: &self.options.model,
            messages: &messages,
            stream: false,
            format: "json",
        };

        let response: ChatResponse = http::post_json(self.client.post(url), &request).await?;
        let content = response.message.content;

        let conversation = conversation
            .cloned()
            .unwrap_or_else(|| Conversation::new(response.created_at))
            .with_exchange(text, &content);

        Ok(AdapterResponse { content, conversation })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    created_at: String,
    message: Message,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}
