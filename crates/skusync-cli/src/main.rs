//! skusync CLI - catalog reconciliation from the command line
//!
//! Provides commands for:
//! - Starting reconciliation scans and polling their progress
//! - Browsing and resolving scan results
//! - Testing connectivity to configured sources
//! - Pulling updates for already-linked records

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    progress::ProgressCommand, pull::PullCommand, resolve::ResolveCommand,
    results::ResultsCommand, scan::ScanCommand, sources::SourcesCommand,
};
use output::OutputFormat;
use skusync_core::config::Config;

/// Default configuration file, relative to the working directory
const DEFAULT_CONFIG_PATH: &str = "skusync.yaml";

#[derive(Debug, Parser)]
#[command(name = "skusync", version, about = "SKU-keyed catalog reconciliation")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a reconciliation scan against one source
    Scan(ScanCommand),
    /// Show the progress of a scan session
    Progress(ProgressCommand),
    /// List the results of a scan session
    Results(ResultsCommand),
    /// Resolve a scan result
    Resolve(ResolveCommand),
    /// Inspect configured sources
    #[command(subcommand)]
    Sources(SourcesCommand),
    /// Pull updates for records already linked to a source
    Pull(PullCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load_or_default(&config_path);

    // -v overrides the configured level; RUST_LOG overrides both.
    let level = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Scan(cmd) => cmd.execute(&config, format).await,
        Commands::Progress(cmd) => cmd.execute(&config, format).await,
        Commands::Results(cmd) => cmd.execute(&config, format).await,
        Commands::Resolve(cmd) => cmd.execute(&config, format).await,
        Commands::Sources(cmd) => cmd.execute(&config, format).await,
        Commands::Pull(cmd) => cmd.execute(&config, format).await,
    }
}
