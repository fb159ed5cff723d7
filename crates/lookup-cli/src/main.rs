//! Lookup CLI - terminal host for record lookups over a SQLite database.
//!
//! Sources are declared in a JSON registry manifest; every source maps to a
//! table of the database.

mod host;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lookup_core::{
    HtmlSpanFormatter, LookupConfig, PlainFormatter, RegistryManifest, RowFormatter,
    SearchAggregator, SelectionSession, SqliteProvider,
};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use host::TerminalHost;

#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "Search and pick records across SQLite tables")]
struct Args {
    /// SQLite database file
    #[arg(long)]
    database: PathBuf,

    /// JSON registry manifest declaring the searchable sources
    #[arg(long)]
    registry: PathBuf,

    /// Minimum query length before searching (overrides the manifest)
    #[arg(long)]
    min_length: Option<usize>,

    /// Render rows as HTML spans instead of plain text
    #[arg(long)]
    html: bool,

    /// Enable debug logging (otherwise RUST_LOG, defaulting to info)
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one search and print the result rows
    Search {
        /// Query text
        text: String,
    },
    /// Pick a record interactively; the selection is printed as JSON
    Pick {
        /// Initial query text
        #[arg(long)]
        initial: Option<String>,

        /// Row to highlight after the initial search
        #[arg(long)]
        index: Option<usize>,
    },
}

/// `--debug` wins over `RUST_LOG`.
fn log_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries results
    FmtSubscriber::builder()
        .with_env_filter(log_filter(args.debug))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let manifest = RegistryManifest::from_path(&args.registry)
        .with_context(|| format!("Failed to read registry {}", args.registry.display()))?;
    let min_length = args
        .min_length
        .or(manifest.min_query_length)
        .unwrap_or(LookupConfig::DEFAULT_MIN_QUERY_LENGTH);
    let registry = manifest.into_registry()?;

    let provider = SqliteProvider::open(&args.database)
        .with_context(|| format!("Failed to open database {}", args.database.display()))?;
    info!(
        "Loaded {} source(s) over {}",
        registry.len(),
        args.database.display()
    );

    let formatter: Box<dyn RowFormatter> = if args.html {
        Box::new(HtmlSpanFormatter)
    } else {
        Box::new(PlainFormatter)
    };

    match args.command {
        Command::Search { text } => {
            let rows = SearchAggregator::new(&provider).run_search(&text, min_length, &registry)?;
            let stdout = io::stdout();
            let mut host = TerminalHost::new(io::empty(), stdout.lock(), formatter.as_ref());
            host.print_rows(&rows)?;
        }
        Command::Pick { initial, index } => {
            let session =
                SelectionSession::new(&provider, &registry).with_min_query_length(min_length);
            let stdin = io::stdin();
            let stdout = io::stdout();
            let mut host = TerminalHost::new(stdin.lock(), stdout.lock(), formatter.as_ref());
            let payload = host.run(session, initial.as_deref(), index)?;
            host.print_payload(&payload)?;
        }
    }

    Ok(())
}
