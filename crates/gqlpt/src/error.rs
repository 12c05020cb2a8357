/// Errors returned by [`GqlptClient`](crate::GqlptClient) and the building blocks it is made of.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// None of type definitions, url or schema were configured
    #[error("missing typeDefs, url or schema")]
    MissingSchemaSource,
    /// More than one schema source was configured
    #[error("expected exactly one of typeDefs, url or schema, got {0}")]
    MultipleSchemaSources(usize),
    /// The type definitions do not parse, or do not build a valid schema
    #[error("cannot parse typeDefs: {0}")]
    SchemaParse(String),
    /// Fetching the schema of a live endpoint failed
    #[error("introspection failed: {0}")]
    Introspection(String),
    /// Generation was requested before a successful `connect`
    #[error("missing typeDefs, url or schema - have you called connect?")]
    NotConnected,
    /// The model answered with something that is not the expected JSON envelope
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// Every repair attempt was used and the last answer was still rejected
    #[error("could not generate a valid query (repair attempts: {attempts}): {}", errors.join("; "))]
    RetryExhausted {
        /// Number of repair round trips that were made.
        attempts: usize,
        /// The last query the model answered with.
        query: String,
        /// The messages that rejected the final answer.
        errors: Vec<String>,
    },
    /// The adapter could not talk to its model
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    /// `generate_and_send` was called without a url or executor to send to
    #[error("missing url or executor to send the generated query to")]
    MissingExecutionTarget,
    /// Sending the generated operation failed
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Errors produced by an [`Adapter`](crate::Adapter) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// The liveness check did not get the expected answer
    #[error("cannot connect to {0}")]
    Handshake(String),
    /// The request could not be sent, or the vendor answered with an error status
    #[error("request failed: {0}")]
    Request(String),
    /// The vendor answered, but not in a shape the adapter understands
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
