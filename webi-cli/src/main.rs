//! webi - browse the WebInstall package catalog from the terminal
//!
//! Every subcommand reads the catalog built from the `webi-installers`
//! repository. Logs go to stderr; stdout carries tables or JSON.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use webi_core::{CatalogConfig, PackageCatalogService};

mod catalog_cli;
mod envelope;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log line format
#[derive(Debug, Clone, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "webi",
    about = "Browse the WebInstall package catalog",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: catalog_cli::CatalogCommand,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Log line format
    #[clap(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Catalog configuration file (defaults to the user config directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,
}

/// Initialize tracing with CLI flags
///
/// `RUST_LOG`, when set, takes precedence over `--log-level`.
fn initialize_tracing(log_level: &LogLevel, log_format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    match log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, &cli.log_format);

    let config = CatalogConfig::load(cli.config.as_deref())?;
    debug!(
        "Using catalog {}/{} on branch {}",
        config.owner, config.repo, config.branch
    );

    let service =
        PackageCatalogService::from_config(&config).context("Failed to set up package catalog")?;

    cli.command.execute(&service).await
}
