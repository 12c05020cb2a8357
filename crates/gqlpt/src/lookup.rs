//! Answers generated ahead of time.
//!
//! The file is a JSON object keyed by schema hash, then by question:
//!
//! ```json
//! {
//!   "<schema hash>": {
//!     "find user 1": { "query": "{ user(id: \"1\") { id name } }", "variables": {} }
//!   }
//! }
//! ```
//!
//! Entries are trusted: a hit is returned as stored, without validation.

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::response::{null_as_empty, Variables};

/// A generated operation with its variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub query: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub variables: Variables,
}

/// The answers stored for one schema hash.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    answers: HashMap<String, GeneratedAnswer>,
}

impl LookupTable {
    /// Loads the answers stored under `schema_hash`.
    ///
    /// The table is an optimization: a missing or unreadable file is an empty table.
    pub fn load(path: &Path, schema_hash: &str) -> Self {
        let cache = match std::fs::read_to_string(path) {
            Ok(content) => QueryCache::from_json(&content),
            Err(err) => {
                tracing::debug!(path = %path.display(), "no generated queries loaded: {err}");
                return Self::default();
            }
        };

        let answers = match cache {
            Ok(mut cache) => cache.hashes.remove(schema_hash).unwrap_or_default(),
            Err(err) => {
                tracing::debug!(path = %path.display(), "no generated queries loaded: {err}");
                return Self::default();
            }
        };

        tracing::debug!(path = %path.display(), count = answers.len(), "loaded generated queries");

        Self {
            answers: answers.into_iter().collect(),
        }
    }

    pub fn get(&self, question: &str) -> Option<&GeneratedAnswer> {
        self.answers.get(question)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl FromIterator<(String, GeneratedAnswer)> for LookupTable {
    fn from_iter<I: IntoIterator<Item = (String, GeneratedAnswer)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

/// The whole lookup file, every schema hash included. Used to write the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryCache {
    hashes: BTreeMap<String, BTreeMap<String, GeneratedAnswer>>,
}

impl QueryCache {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Stores an answer, replacing one for the same schema and question.
    pub fn insert(&mut self, schema_hash: &str, question: impl Into<String>, answer: GeneratedAnswer) {
        self.hashes
            .entry(schema_hash.to_owned())
            .or_default()
            .insert(question.into(), answer);
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
