//! Translates plain text questions into GraphQL operations with a language model.
//!
//! The model only ever proposes an operation. Before an answer is returned it
//! is decoded, checked against a list of excluded fields, rewritten into a
//! canonical form and validated against the schema; rejected answers are sent
//! back to the model with the reasons until it gets them right or the repair
//! budget is spent.
//!
//! ```no_run
//! # async fn run(adapter: std::sync::Arc<dyn gqlpt::Adapter>) -> Result<(), gqlpt::Error> {
//! let options = gqlpt::ClientOptions::new(adapter)
//!     .with_type_defs("type User { id: ID! name: String! } type Query { user(id: ID!): User }");
//!
//! let mut client = gqlpt::GqlptClient::new(options)?;
//! client.connect().await?;
//!
//! let answer = client.generate_query_and_variables("find user 1").await?;
//! println!("{}", answer.query);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod adapter;
pub mod canonical;
mod client;
mod error;
pub mod execute;
pub mod lookup;
pub mod prompt;
pub mod response;
mod retry;
pub mod schema;
pub mod validation;

pub use adapter::{Adapter, AdapterResponse, Conversation, Message, Role};
pub use apollo_compiler;
pub use client::{ClientOptions, GeneratedBuildAnswer, GqlptClient, SchemaSource, SendOptions, DEFAULT_MAX_RETRIES};
pub use error::{AdapterError, Error};
pub use execute::{Executor, GraphqlRequest, GraphqlResponse, HttpExecutor};
pub use lookup::{GeneratedAnswer, LookupTable, QueryCache};
pub use response::Variables;
pub use schema::NormalizedSchema;
