//! Vendor adapters for the gqlpt client.
//!
//! Each adapter talks to one chat completion API over HTTP and replays the
//! conversation history it is handed, so follow-up prompts reach the model
//! with the full exchange before them.
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use gqlpt::{ClientOptions, GqlptClient};
//! use gqlpt_adapters::{OpenAiAdapter, OpenAiOptions};
//!
//! let adapter = OpenAiAdapter::new(OpenAiOptions::new("sk-..."))?;
//! let options = ClientOptions::new(Arc::new(adapter)).with_type_defs("type Query { hello: String }");
//!
//! let mut client = GqlptClient::new(options)?;
//! client.connect().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(unused_crate_dependencies))]

mod anthropic;
mod http;
mod ollama;
mod openai;

pub use anthropic::{AnthropicAdapter, AnthropicOptions, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL};
pub use ollama::{OllamaAdapter, OllamaOptions, DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL};
pub use openai::{OpenAiAdapter, OpenAiOptions, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
