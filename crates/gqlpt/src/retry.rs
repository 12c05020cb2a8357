//! The loop that turns a question into an accepted operation.
//!
//! ```text
//! Fresh -> Validating -> Accepted
//!              ^    \--> Exhausted
//!              |     \-> Repairing
//!              \------------/
//! ```
//!
//! Every answer is decoded, checked for excluded fields, canonicalized and
//! validated against the schema. A rejected answer is sent back to the model
//! with the reasons, on the conversation the previous round trip returned,
//! until the repair budget runs out.

use std::collections::BTreeSet;

use crate::{
    adapter::{Adapter, Conversation},
    canonical,
    lookup::GeneratedAnswer,
    prompt::{build_initial_prompt, build_repair_prompt, ResponseFormat},
    response::Envelope,
    schema::NormalizedSchema,
    validation::{validate_against_schema, validate_excluded_fields},
    Error,
};

pub(crate) struct RetryController<'c> {
    pub adapter: &'c dyn Adapter,
    pub schema: &'c NormalizedSchema,
    pub compressed_schema: &'c str,
    pub max_retries: usize,
    pub excluded_field_names: &'c BTreeSet<String>,
}

/// An answer that passed every check.
#[derive(Debug)]
pub(crate) struct Accepted {
    pub answer: GeneratedAnswer,
    pub type_definition: Option<String>,
}

enum State {
    Fresh,
    Validating {
        reply: String,
        conversation: Conversation,
    },
    Repairing {
        query: String,
        errors: Vec<String>,
        conversation: Conversation,
    },
    Accepted(Accepted),
    Exhausted {
        query: String,
        errors: Vec<String>,
    },
}

#[derive(Debug)]
enum Verdict {
    Accepted(Accepted),
    Rejected { query: String, errors: Vec<String> },
}

impl RetryController<'_> {
    pub async fn run(&self, question: &str, format: ResponseFormat) -> Result<Accepted, Error> {
        let mut attempts = 0;
        let mut state = State::Fresh;

        loop {
            state = match state {
                State::Fresh => {
                    let prompt = build_initial_prompt(self.compressed_schema, question, format);
                    let response = self.adapter.send_text(&prompt, None).await?;

                    tracing::debug!(conversation = response.conversation.id(), "received an answer");

                    State::Validating {
                        reply: response.content,
                        conversation: response.conversation,
                    }
                }
                State::Validating { reply, conversation } => match self.evaluate(&reply, format) {
                    Verdict::Accepted(accepted) => State::Accepted(accepted),
                    Verdict::Rejected { query, errors } => {
                        tracing::warn!(attempts, errors = errors.len(), "generated query was rejected");

                        if attempts >= self.max_retries {
                            State::Exhausted { query, errors }
                        } else {
                            State::Repairing {
                                query,
                                errors,
                                conversation,
                            }
                        }
                    }
                },
                State::Repairing {
                    query,
                    errors,
                    conversation,
                } => {
                    attempts += 1;

                    let prompt = build_repair_prompt(&query, &errors, self.excluded_field_names, format);
                    let response = self.adapter.send_text(&prompt, Some(&conversation)).await?;

                    tracing::debug!(
                        attempts,
                        conversation = response.conversation.id(),
                        "received a repaired answer"
                    );

                    State::Validating {
                        reply: response.content,
                        conversation: response.conversation,
                    }
                }
                State::Accepted(accepted) => return Ok(accepted),
                State::Exhausted { query, errors } => {
                    tracing::warn!(attempts, "no valid query could be generated");

                    return Err(Error::RetryExhausted {
                        attempts,
                        query,
                        errors,
                    });
                }
            }
        }
    }

    fn evaluate(&self, reply: &str, format: ResponseFormat) -> Verdict {
        let envelope = match Envelope::parse(reply, format) {
            Ok(envelope) => envelope,
            Err(err) => {
                return Verdict::Rejected {
                    query: reply.to_owned(),
                    errors: vec![err.to_string()],
                }
            }
        };

        let query = {
            let document = match envelope.document() {
                Ok(document) => document,
                Err(err) => {
                    return Verdict::Rejected {
                        query: envelope.query.clone(),
                        errors: vec![err.to_string()],
                    }
                }
            };

            // exclusions are checked on what the model wrote, before any rewriting
            let errors = validate_excluded_fields(&document, self.excluded_field_names);

            if !errors.is_empty() {
                return Verdict::Rejected {
                    query: envelope.query.clone(),
                    errors,
                };
            }

            match canonical::canonicalize(&envelope.query) {
                Ok(query) => query,
                Err(err) => {
                    return Verdict::Rejected {
                        query: envelope.query.clone(),
                        errors: vec![err.to_string()],
                    }
                }
            }
        };

        let errors = validate_against_schema(self.schema.schema(), &query);

        if !errors.is_empty() {
            return Verdict::Rejected { query, errors };
        }

        Verdict::Accepted(Accepted {
            answer: GeneratedAnswer {
                query,
                variables: envelope.variables,
            },
            type_definition: envelope.type_definition,
        })
    }
}
