//! The boundary between the client and a language model vendor.
//!
//! An adapter can do two things: check that the model is reachable, and send a
//! piece of text, optionally as the continuation of an earlier exchange. The
//! continuation is carried by a [`Conversation`] value that the adapter hands
//! back with every answer; the caller threads it into the next call. Adapters
//! keep no per-conversation state of their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AdapterError;

/// Who wrote a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An opaque continuation handle.
///
/// The identifier names the exchange for logging and for vendors that track
/// conversations server side. The message history lets stateless vendor APIs
/// replay the exchange on the next call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the conversation extended with one prompt and the model's reply to it.
    #[must_use]
    pub fn with_exchange(mut self, prompt: impl Into<String>, reply: impl Into<String>) -> Self {
        self.messages.push(Message::user(prompt));
        self.messages.push(Message::assistant(reply));
        self
    }
}

/// The answer of one adapter round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterResponse {
    /// The raw text the model produced.
    pub content: String,
    /// The handle to pass to the next `send_text` call of the same exchange.
    pub conversation: Conversation,
}

/// A language model the client can translate questions with.
///
/// Vendor specifics (model name, token limits, temperature) are configured on
/// the implementation, never passed per call.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Checks that the model is reachable and answers as expected.
    async fn connect(&self) -> Result<(), AdapterError>;

    /// Sends `text` to the model. Passing a conversation continues that exchange,
    /// passing `None` starts a new one.
    async fn send_text(&self, text: &str, conversation: Option<&Conversation>) -> Result<AdapterResponse, AdapterError>;
}
