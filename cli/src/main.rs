//! CLI for the dependency auditor.
//!
//! Scans every repository owned by a GitHub user or organization, aggregates
//! the declared npm dependencies, and enriches them with license and
//! description metadata from the npm registry. Also ships two small tools
//! for working with persisted reports: a flat-text renderer and a filter
//! that drops entries with no known metadata.

use clap::{Args, Parser, Subcommand};
use dependency_auditor::{
    filter_known, render_text, DependencyRecord, Runner, RunnerConfig, RunnerError,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Dependency Auditor - aggregate and enrich npm dependencies across a GitHub account.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a GitHub user or organization and print the report as JSON.
    Scan(ScanArgs),

    /// Render a persisted combined-unique report as flat text.
    Report(FileArgs),

    /// Filter a persisted combined-unique report to entries with known metadata.
    Filter(FileArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// GitHub Personal Access Token.
    ///
    /// See https://github.com/settings/tokens to create one; no permissions
    /// need to be checked for public repositories.
    #[arg(long, env = "GITHUB_TOKEN")]
    token: String,

    /// GitHub login of the user or organization to audit.
    #[arg(long)]
    target: String,

    /// Flatten and deduplicate dependencies across all repositories.
    #[arg(long)]
    combined_unique: bool,

    /// Maximum concurrent network requests.
    #[arg(long, default_value_t = 5)]
    concurrency: usize,

    /// Override the package metadata registry base URL.
    #[arg(long)]
    registry_url: Option<String>,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Path to a persisted JSON report (a flat list of dependency records).
    file: PathBuf,
}

/// Errors surfaced to the operator.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Audit run failure.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// Failed to read a persisted report.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a persisted report.
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to serialize output.
    #[error("Failed to serialize report: {0}")]
    Serialize(serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        // Use compact formatting without module target paths for cleaner output
        .with(fmt::layer().compact().with_target(false))
        // Allow runtime log filtering via RUST_LOG env var (e.g., RUST_LOG=debug)
        // Falls back to "info" level if RUST_LOG is not set or invalid
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // Register as the global default subscriber
        .init();
}

/// Main execution logic.
async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Scan(args) => scan(args).await,
        Command::Report(args) => {
            let records = read_records(&args.file)?;
            print!("{}", render_text(&records));
            Ok(())
        }
        Command::Filter(args) => {
            let records = read_records(&args.file)?;
            let kept = filter_known(records);
            let json = serde_json::to_string_pretty(&kept).map_err(CliError::Serialize)?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Runs the aggregation pipeline and prints the report to stdout.
async fn scan(args: ScanArgs) -> Result<(), CliError> {
    let mut config = RunnerConfig::new(args.token, args.target)
        .with_combined_unique(args.combined_unique)
        .with_concurrency(args.concurrency);
    if let Some(registry_url) = args.registry_url {
        config = config.with_registry_url(registry_url);
    }

    let runner = Runner::new(config)?;
    let result = runner.run().await?;

    let json = serde_json::to_string_pretty(&result).map_err(CliError::Serialize)?;
    println!("{json}");
    Ok(())
}

/// Loads a persisted flat record list from disk.
fn read_records(path: &Path) -> Result<Vec<DependencyRecord>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| CliError::Parse {
        path: path.display().to_string(),
        source,
    })
}
