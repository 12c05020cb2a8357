use std::{collections::BTreeMap, fs, path::Path};

use anyhow::Context;
use gqlpt::QueryCache;

/// Result types by question, rendered as a TypeScript declaration file.
#[derive(Debug, Default)]
pub(crate) struct TypeMap {
    entries: BTreeMap<String, String>,
}

impl TypeMap {
    pub(crate) fn insert(&mut self, question: impl Into<String>, type_definition: impl Into<String>) {
        self.entries.insert(question.into(), type_definition.into());
    }

    pub(crate) fn render(&self) -> anyhow::Result<String> {
        let mut entries = String::new();

        for (question, type_definition) in &self.entries {
            let key = serde_json::to_string(question)?;
            entries.push_str(&format!("  {key}: {};\n", type_definition.trim().trim_end_matches(';')));
        }

        Ok(format!(
            "// This file is auto-generated. Do not edit manually.\n\
             // eslint-disable-next-line @typescript-eslint/no-empty-object-type\n\
             export interface GeneratedTypeMap {{\n\
             {entries}}}\n\
             \n\
             // Default type map for when the CLI is not used\n\
             export type DefaultTypeMap = Record<string, any>;\n"
        ))
    }
}

/// Reads the query cache at `path`, or an empty one when there is no file yet.
pub(crate) fn load_query_cache(path: &Path) -> anyhow::Result<QueryCache> {
    if !path.exists() {
        return Ok(QueryCache::default());
    }

    let content = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;

    QueryCache::from_json(&content).with_context(|| format!("{} is not a query cache", path.display()))
}

/// Writes `content` to `path`, creating its parent directories.
pub(crate) fn write(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("cannot create {}", parent.display()))?;
    }

    fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))
}
