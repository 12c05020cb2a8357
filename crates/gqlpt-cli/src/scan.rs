//! Finds the questions a code base asks, by looking for `generateAndSend` and
//! `generate_and_send` calls in its sources.

use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use anyhow::Context;
use regex::{Captures, Regex};
use walkdir::{DirEntry, WalkDir};

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "rs"];
const SKIPPED_DIRECTORIES: &[&str] = &["node_modules", "target", "dist", "build"];

const STRING_LITERAL: &str = r#""((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'|`([^`$\\]*)`"#;

fn call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();

    PATTERN.get_or_init(|| {
        let pattern =
            format!(r"\b(?:generateAndSend|generate_and_send)\s*\(\s*(?:{STRING_LITERAL}|([A-Za-z_$][\w$]*)\s*[,)])");

        Regex::new(&pattern).expect("valid regex")
    })
}

fn binding_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();

    PATTERN.get_or_init(|| {
        let pattern =
            format!(r"\b(?:const|let|var)\s+(?:mut\s+)?([A-Za-z_$][\w$]*)\s*(?::[^=;]+)?=\s*(?:{STRING_LITERAL})");

        Regex::new(&pattern).expect("valid regex")
    })
}

/// The source files under `root`, in file name order.
pub(crate) fn source_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker {
        let entry = entry.with_context(|| format!("cannot scan {}", root.display()))?;

        let is_source = entry
            .path()
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| SOURCE_EXTENSIONS.contains(&extension));

        if entry.file_type().is_file() && is_source {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();

    entry.file_type().is_dir()
        && (name.starts_with('.') || SKIPPED_DIRECTORIES.iter().any(|skipped| *skipped == name))
}

/// Every question asked in the given files, deduplicated and sorted.
pub(crate) fn collect_questions(files: &[PathBuf]) -> anyhow::Result<BTreeSet<String>> {
    let mut questions = BTreeSet::new();

    for file in files {
        let content = std::fs::read_to_string(file).with_context(|| format!("cannot read {}", file.display()))?;
        let found = questions_in(&content);

        if !found.is_empty() {
            tracing::debug!(file = %file.display(), count = found.len(), "found questions");
        }

        questions.extend(found);
    }

    Ok(questions)
}

/// The questions of a single source file.
///
/// A call either passes a string literal, or an identifier bound to a string
/// literal somewhere in the same file. Other arguments are not resolved.
pub(crate) fn questions_in(content: &str) -> Vec<String> {
    let bindings: HashMap<&str, String> = binding_pattern()
        .captures_iter(content)
        .filter_map(|captures| {
            let name = captures.get(1)?.as_str();
            let value = literal(&captures, 2)?;

            Some((name, value))
        })
        .collect();

    call_pattern()
        .captures_iter(content)
        .filter_map(|captures| match captures.get(4) {
            Some(identifier) => bindings.get(identifier.as_str()).cloned(),
            None => literal(&captures, 1),
        })
        .filter(|question| !question.trim().is_empty())
        .collect()
}

/// The value of the string literal whose first alternative is capture group `first`.
fn literal(captures: &Captures<'_>, first: usize) -> Option<String> {
    if let Some(double_quoted) = captures.get(first) {
        return Some(unescape(double_quoted.as_str()));
    }

    if let Some(single_quoted) = captures.get(first + 1) {
        return Some(unescape(single_quoted.as_str()));
    }

    captures.get(first + 2).map(|template| template.as_str().to_owned())
}

fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    result
}
