use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use url::Url;

/// Generate queries and result types for every question found in the source directory
#[derive(Debug, Parser)]
pub(crate) struct GenerateCommand {
    /// Source directory to scan for generate_and_send calls
    pub source: PathBuf,
    /// The language model vendor
    #[arg(short, long, value_enum, default_value_t = AdapterKind::OpenAi)]
    pub adapter: AdapterKind,
    /// API key of the vendor, read from OPENAI_API_KEY or ANTHROPIC_API_KEY when missing
    #[arg(short, long)]
    pub key: Option<String>,
    /// Overrides the vendor's default model
    #[arg(short, long)]
    pub model: Option<String>,
    /// Base URL of the Ollama instance
    #[arg(long, env = "OLLAMA_BASE_URL", default_value = gqlpt_adapters::DEFAULT_OLLAMA_BASE_URL)]
    pub ollama_url: String,
    /// Path to the schema type definitions
    #[arg(short, long, default_value = "./schema.gql", conflicts_with = "url")]
    pub type_defs: PathBuf,
    /// Introspect the schema from this GraphQL endpoint instead of reading type definitions
    #[arg(short, long)]
    pub url: Option<Url>,
    /// A header sent with the introspection request, as NAME:VALUE
    #[arg(long = "header", value_parser = parse_header, requires = "url")]
    pub headers: Vec<(String, String)>,
    /// Output path of the generated type map
    #[arg(short, long, default_value = "gqlpt/types.d.ts")]
    pub output: PathBuf,
    /// Output path of the generated query cache, merged with its current content
    #[arg(short, long, default_value = "gqlpt/generated.json")]
    pub generated_path: PathBuf,
    /// Print the type map to stdout instead of writing it
    #[arg(long)]
    pub raw: bool,
    /// Print the query cache to stdout instead of writing it
    #[arg(long)]
    pub raw_queries: bool,
    /// How many repair prompts a question may use
    #[arg(long, default_value_t = gqlpt::DEFAULT_MAX_RETRIES)]
    pub max_retries: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum AdapterKind {
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
    Ollama,
}

impl AdapterKind {
    /// The environment variable holding the API key, if the vendor needs one.
    pub(crate) fn key_variable(self) -> Option<&'static str> {
        match self {
            AdapterKind::OpenAi => Some("OPENAI_API_KEY"),
            AdapterKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            AdapterKind::Ollama => None,
        }
    }
}

fn parse_header(value: &str) -> Result<(String, String), String> {
    let (name, value) = value
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got `{value}`"))?;

    Ok((name.trim().to_owned(), value.trim().to_owned()))
}
