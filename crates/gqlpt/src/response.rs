//! Decoding of the model's answer.

use graphql_parser::query::Document;
use serde::{Deserialize, Deserializer};

use crate::{prompt::ResponseFormat, Error};

/// Variables of a generated operation, in the order the model wrote them.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// The JSON object the model is asked to answer with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub query: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub variables: Variables,
    #[serde(default)]
    pub type_definition: Option<String>,
}

impl Envelope {
    /// Decodes the raw text of an answer.
    ///
    /// Models like to wrap JSON in markdown fences, so backticks and a leading
    /// `json` language tag are dropped before decoding. When `format` asks for a
    /// type definition, an answer without one is malformed.
    pub fn parse(raw: &str, format: ResponseFormat) -> Result<Self, Error> {
        let text = raw.replace('`', "");
        let text = text.trim();
        let text = text.strip_prefix("json").map(str::trim_start).unwrap_or(text);

        let envelope: Envelope =
            serde_json::from_str(text).map_err(|error| Error::MalformedResponse(error.to_string()))?;

        if format == ResponseFormat::QueryWithType && envelope.type_definition.is_none() {
            return Err(Error::MalformedResponse(String::from("missing field `typeDefinition`")));
        }

        Ok(envelope)
    }

    /// Parses the query text of the answer.
    pub fn document(&self) -> Result<Document<'_, &str>, Error> {
        graphql_parser::parse_query::<&str>(&self.query).map_err(|error| Error::MalformedResponse(error.to_string()))
    }
}

pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<Variables, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Variables>::deserialize(deserializer)?.unwrap_or_default())
}
