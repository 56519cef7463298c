//! Command implementations and dispatch logic.
//!
//! Each command is an async function taking the shared [`CommandContext`].

use camino::{Utf8Path, Utf8PathBuf};
use pkgate_config::{ConfigLoader, ConfigSource, GatewayConfig};
use pkgate_core::error::{GatewayError, GatewayResult};
use pkgate_core::types::PackageName;
use pkgate_registry::{Gateway, TracingLogger};
use std::path::Path;
use tracing::info;

pub mod check;
pub mod fetch;
pub mod manifest;
pub mod versions;


use crate::{Commands, output::OutputHandler};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub config: GatewayConfig,
    pub source: ConfigSource,
    pub gateway: Gateway,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Load configuration and build the gateway
    pub async fn new(config_path: Option<&Path>) -> GatewayResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| GatewayError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| GatewayError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("{} is not valid UTF-8", path.display()),
        })?;

        let explicit = config_path
            .map(|path| {
                Utf8Path::from_path(path).ok_or_else(|| GatewayError::ConfigValidation {
                    field: "--config".to_string(),
                    reason: format!("{} is not valid UTF-8", path.display()),
                })
            })
            .transpose()?;

        let (config, source) = ConfigLoader::new(cwd.clone()).load(explicit).await?;
        info!("Loaded configuration from {:?}", source);

        Self::from_config(cwd, config, source)
    }

    /// Build a context around an already loaded configuration
    pub fn from_config(cwd: Utf8PathBuf, config: GatewayConfig, source: ConfigSource) -> GatewayResult<Self> {
        let gateway = Gateway::from_config(&config)?;

        Ok(Self {
            cwd,
            config,
            source,
            gateway,
            output: OutputHandler::new(),
        })
    }

    /// Request logger for one command invocation
    pub fn logger(&self, command: &str) -> TracingLogger {
        TracingLogger::new(format!("{}-{}", command, std::process::id()))
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> GatewayResult<()> {
    match command {
        Commands::Versions { name } => {
            info!("Listing versions of {}", name);
            versions::execute(parse_name(&name)?, ctx).await
        }
        Commands::Manifest { name, version } => {
            info!("Showing manifest of {}@{}", name, version);
            manifest::execute(parse_name(&name)?, version, ctx).await
        }
        Commands::Fetch { name, version, output } => {
            info!("Fetching {}@{} (output: {:?})", name, version, output);
            fetch::execute(parse_name(&name)?, version, output, ctx).await
        }
        Commands::Check { name } => {
            info!("Checking configuration");
            let name = name.as_deref().map(parse_name).transpose()?;
            check::execute(name, ctx).await
        }
    }
}

fn parse_name(raw: &str) -> GatewayResult<PackageName> {
    raw.parse()
}
