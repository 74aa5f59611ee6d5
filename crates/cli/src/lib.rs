pub mod commands {
    pub mod enumerate;
    pub mod find_after;
    pub mod populate;
    pub mod query;
    pub mod watch;
}
pub mod util;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use gleaner_core::{ExtractOverrides, ExtractSettings, Profile};
use gleaner_provider_document::DocumentTree;
use gleaner_runtime::Extractor;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gleaner", version, about = "Extract typed records from a document tree")]
pub struct Cli {
    /// XML document to extract from.
    #[arg(long, short = 'd', value_name = "XML")]
    pub document: PathBuf,
    /// JSON profile with record types and settings.
    #[arg(long, short = 'p', value_name = "JSON")]
    pub profile: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    /// Log level used when RUST_LOG is not set.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,
    #[command(flatten)]
    pub timeouts: TimeoutArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TimeoutArgs {
    #[arg(long, value_name = "MS")]
    pub ready_timeout_ms: Option<u64>,
    #[arg(long, value_name = "MS")]
    pub field_timeout_ms: Option<u64>,
    #[arg(long, value_name = "MS")]
    pub probe_timeout_ms: Option<u64>,
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,
    /// Consecutive empty positions tolerated while scanning.
    #[arg(long, value_name = "N")]
    pub lookahead: Option<usize>,
}

impl TimeoutArgs {
    pub fn to_overrides(&self) -> ExtractOverrides {
        ExtractOverrides {
            ready_timeout: self.ready_timeout_ms.map(Duration::from_millis),
            field_timeout: self.field_timeout_ms.map(Duration::from_millis),
            probe_timeout: self.probe_timeout_ms.map(Duration::from_millis),
            poll_interval: self.poll_interval_ms.map(Duration::from_millis),
            lookahead: self.lookahead,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the nodes matching a locator.
    Query(commands::query::QueryArgs),
    /// Populate one record.
    Populate(commands::populate::PopulateArgs),
    /// Populate records by logical index.
    Enumerate(commands::enumerate::EnumerateArgs),
    /// Walk forward from an anchor record.
    FindAfter(commands::find_after::FindAfterArgs),
    /// Poll the document for new records at the top of a feed.
    Watch(commands::watch::WatchArgs),
}

/// Loaded document plus an extractor with every profile type registered.
pub struct Session {
    pub document: PathBuf,
    pub tree: Arc<DocumentTree>,
    pub extractor: Extractor,
}

impl Session {
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        let profile = match &cli.profile {
            Some(path) => Profile::from_path(path).with_context(|| format!("loading profile {}", path.display()))?,
            None => Profile::default(),
        };
        let tree = Arc::new(DocumentTree::new(util::load_document(&cli.document)?));
        let overrides = profile.settings.to_overrides().merge(&cli.timeouts.to_overrides());
        let settings = ExtractSettings::default().with_overrides(&overrides);
        debug!(?settings, types = profile.types.len(), "session settings");

        let mut extractor = Extractor::new(tree.clone(), settings);
        for record_type in profile.types {
            extractor.register(record_type);
        }
        Ok(Self { document: cli.document.clone(), tree, extractor })
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);
    let mut stdout = io::stdout();
    execute(&cli, &mut stdout)
}

/// Runs the parsed command and writes its output to `writer`.
pub fn execute<W: Write>(cli: &Cli, writer: &mut W) -> anyhow::Result<()> {
    let session = Session::open(cli)?;
    let format = cli.format;
    let output = match &cli.command {
        Command::Query(args) => commands::query::run(&session.tree, args, format),
        Command::Populate(args) => commands::populate::run(&session.extractor, args, format),
        Command::Enumerate(args) => commands::enumerate::run(&session.extractor, args, format),
        Command::FindAfter(args) => commands::find_after::run(&session.extractor, args, format),
        Command::Watch(args) => {
            return commands::watch::run(&session, args, format, writer).map_err(util::into_anyhow);
        }
    }
    .map_err(util::into_anyhow)?;
    writeln!(writer, "{output}").context("writing output")?;
    Ok(())
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}
