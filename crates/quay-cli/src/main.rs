//! # quay-cli
//!
//! Command line interface for the Quay registry metadata engine.
//!
//! This is the main entry point for the `quay` binary. It handles command
//! parsing, sets up logging and error reporting, and dispatches to the
//! appropriate command handlers.

use std::collections::HashMap;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use quay_core::error::QuayError;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Enumerate package releases across Composer registries
#[derive(Parser)]
#[command(name = "quay", version, about = "Enumerate package releases across Composer registries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Cache directory
    #[arg(long, global = true, env = "QUAY_CACHE_DIR")]
    pub cache_dir: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the releases of a package
    Releases {
        /// Package name, e.g. `acme/widgets`
        package: String,
        /// Registry to query; repeat to try several in order
        #[arg(long = "registry", value_name = "URL")]
        registries: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the persistent cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Remove expired cache records
    Clean {
        /// Remove every record, not only expired ones
        #[arg(long)]
        all: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_json);
    setup_panic_handler();

    debug!("Starting Quay CLI v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let formatter = ErrorFormatter::new();
            match err.downcast_ref::<QuayError>() {
                Some(quay_error) => eprint!("{}", formatter.format_error(quay_error)),
                None => eprintln!("{}", formatter.format_simple(&format!("{:#}", err))),
            }
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async move {
        let ctx = CommandContext::new(cli_overrides(&cli)).await?;
        commands::dispatch_command(cli.command, &ctx).await?;
        Ok::<(), anyhow::Error>(())
    })
}

/// Flags that override configuration layers
fn cli_overrides(cli: &Cli) -> HashMap<String, String> {
    let mut overrides = HashMap::new();
    if let Some(dir) = &cli.cache_dir {
        overrides.insert("cache-dir".to_string(), dir.clone());
    }
    if let Some(timeout) = cli.timeout {
        overrides.insert("timeout".to_string(), timeout.to_string());
    }
    if let Commands::Releases { registries, .. } = &cli.command {
        if !registries.is_empty() {
            overrides.insert("registry".to_string(), registries.join(","));
        }
    }
    overrides
}

fn setup_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "quay={level},quay_core={level},quay_registry={level},quay_cache={level},quay_config={level}"
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Quay encountered an unexpected error: {}", panic_info);
        eprintln!("Quay crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/quay-rs/quay/issues");
        eprintln!("Error: {}", panic_info);
    }));
}
