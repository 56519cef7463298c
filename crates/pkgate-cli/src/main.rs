//! # pkgate-cli
//!
//! Command line front end for the pkgate registry gateway.
//!
//! Parses arguments, installs logging and dispatches to the command handlers.
//! Query results go to stdout; logs and status messages go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pkgate_core::error::GatewayError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Caching gateway in front of private and public npm registries
#[derive(Parser)]
#[command(name = "pkgate", version, about = "Caching npm registry gateway")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file, instead of searching for pkgate.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List published versions and dist-tags of a package
    Versions {
        name: String,
    },
    /// Show the trimmed manifest of one package version
    Manifest {
        name: String,
        version: String,
    },
    /// Download the decompressed tarball of one package version
    Fetch {
        name: String,
        version: String,
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Show the effective configuration and where a package would be routed
    Check {
        name: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.json_logs);
    setup_panic_handler();

    info!("Starting pkgate v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let formatter = ErrorFormatter::new();
            match err.downcast_ref::<GatewayError>() {
                Some(gateway_error) => eprint!("{}", formatter.format_error(gateway_error)),
                None => eprintln!("{}", formatter.format_simple(&format!("{:#}", err))),
            }
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;

    rt.block_on(async {
        let ctx = CommandContext::new(cli.config.as_deref()).await?;
        commands::dispatch_command(cli.command, &ctx).await?;
        Ok::<_, anyhow::Error>(())
    })
}

fn setup_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pkgate={},pkgate_registry={}", level, level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("pkgate encountered an unexpected error: {}", panic_info);
        eprintln!("pkgate crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
