use std::io::IsTerminal;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

mod generate;

pub(crate) use generate::{AdapterKind, GenerateCommand};

#[derive(Debug, Parser)]
#[command(name = "gqlpt", version)]
#[command(arg_required_else_help = true)]
/// Turn plain text questions into GraphQL queries
pub(crate) struct Args {
    #[command(subcommand)]
    pub command: SubCommand,
    /// Set the logging level
    #[arg(long = "log", env = "GQLPT_LOG", global = true)]
    pub log_level: Option<LogLevel>,
    /// Set the style of log output
    #[arg(long, env = "GQLPT_LOG_STYLE", default_value = "text", global = true)]
    pub log_style: LogStyle,
}

#[derive(Debug, Subcommand)]
pub(crate) enum SubCommand {
    Generate(GenerateCommand),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogLevel {
    /// No output at all
    Off,
    Error,
    Warn,
    /// Progress of the scan and the generation, the default
    Info,
    /// Also prompts, model answers and rejected queries
    Debug,
    /// Everything, dependencies included
    Trace,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogStyle {
    Text,
    Json,
}

// below trace, only events of the gqlpt crates are shown; their targets all start with `gqlpt`
fn log_filter(level: Option<LogLevel>) -> &'static str {
    match level.unwrap_or(LogLevel::Info) {
        LogLevel::Off => "off",
        LogLevel::Error => "gqlpt=error,off",
        LogLevel::Warn => "gqlpt=warn,off",
        LogLevel::Info => "gqlpt=info,off",
        LogLevel::Debug => "gqlpt=debug,off",
        LogLevel::Trace => "trace",
    }
}

impl Args {
    /// Installs the global subscriber. Logs go to stderr, stdout is kept for `--raw` output.
    pub fn init_logging(&self) {
        let filter = EnvFilter::new(log_filter(self.log_level));
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.log_style {
            // for interactive terminals we provide colored output
            LogStyle::Text if std::io::stderr().is_terminal() => layer.with_ansi(true).boxed(),
            LogStyle::Text => layer.with_ansi(false).boxed(),
            LogStyle::Json => layer.json().boxed(),
        };

        tracing_subscriber::registry().with(layer).with(filter).init();
    }
}

pub(crate) fn parse() -> Args {
    Args::parse()
}
