//! Configuration file discovery and environment overrides

use std::collections::HashMap;
use camino::{Utf8Path, Utf8PathBuf};
use pkgate_core::error::GatewayError;
use crate::{ConfigResult, toml::{GatewayConfig, validate_config}};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "pkgate.toml";

/// Environment variables understood by the loader
pub const ENV_PUBLIC_REGISTRY_URL: &str = "NPM_REGISTRY_URL";
pub const ENV_PRIVATE_REGISTRY_URL: &str = "PKGATE_PRIVATE_REGISTRY_URL";
pub const ENV_PRIVATE_SCOPES: &str = "PKGATE_PRIVATE_SCOPES";
pub const ENV_PRIVATE_TOKEN: &str = "PKGATE_PRIVATE_TOKEN";
pub const ENV_CACHE_MAX_BYTES: &str = "PKGATE_CACHE_MAX_BYTES";
pub const ENV_CACHE_TTL_SECS: &str = "PKGATE_CACHE_TTL_SECS";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Directory the search for pkgate.toml starts from
    cwd: Utf8PathBuf,
    /// Environment snapshot used for overrides
    env: HashMap<String, String>,
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Path given on the command line
    Explicit(Utf8PathBuf),
    /// pkgate.toml found in the working directory or a parent
    Project(Utf8PathBuf),
    /// ~/.pkgate/config.toml
    Global(Utf8PathBuf),
    /// No file, built-in defaults
    Defaults,
}

impl ConfigLoader {
    /// Create a loader that reads overrides from the process environment
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self::with_env(cwd, Self::collect_env_overrides())
    }

    /// Create a loader with an explicit environment snapshot
    pub fn with_env(cwd: Utf8PathBuf, env: HashMap<String, String>) -> Self {
        Self { cwd, env }
    }

    /// Load the effective configuration.
    ///
    /// An explicit path must exist. Otherwise pkgate.toml is searched upwards
    /// from the working directory, then the global config, then defaults.
    /// Environment overrides are applied last and the result is validated.
    pub async fn load(&self, explicit: Option<&Utf8Path>) -> ConfigResult<(GatewayConfig, ConfigSource)> {
        let (mut config, source) = match explicit {
            Some(path) => {
                let config = crate::toml::load_from_file(path).await?;
                (config, ConfigSource::Explicit(path.to_path_buf()))
            }
            None => self.load_discovered().await?,
        };

        Self::apply_env_overrides(&mut config, &self.env)?;
        validate_config(&config)?;

        Ok((config, source))
    }

    async fn load_discovered(&self) -> ConfigResult<(GatewayConfig, ConfigSource)> {
        if let Some(path) = self.find_project_config() {
            let config = crate::toml::load_from_file(&path).await?;
            return Ok((config, ConfigSource::Project(path)));
        }

        if let Some(path) = Self::global_config_path() {
            if path.exists() {
                let config = crate::toml::load_from_file(&path).await?;
                return Ok((config, ConfigSource::Global(path)));
            }
        }

        Ok((GatewayConfig::default(), ConfigSource::Defaults))
    }

    /// Find pkgate.toml in the working directory or its parents
    pub fn find_project_config(&self) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Some(candidate);
            }
            current = dir.parent();
        }

        None
    }

    /// Path of the per-user configuration file
    pub fn global_config_path() -> Option<Utf8PathBuf> {
        let home = dirs::home_dir()?;
        let home = Utf8PathBuf::try_from(home).ok()?;
        Some(home.join(".pkgate").join("config.toml"))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut GatewayConfig, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                ENV_PUBLIC_REGISTRY_URL if !value.is_empty() => {
                    config.registry.public_url = value.clone();
                }
                ENV_PRIVATE_REGISTRY_URL if !value.is_empty() => {
                    config.registry.private_url = value.clone();
                }
                ENV_PRIVATE_SCOPES => {
                    config.registry.private_scopes = value
                        .split(',')
                        .map(str::trim)
                        .filter(|scope| !scope.is_empty())
                        .map(String::from)
                        .collect();
                }
                ENV_PRIVATE_TOKEN if !value.is_empty() => {
                    config.registry.private_token = Some(value.clone());
                }
                ENV_CACHE_MAX_BYTES => {
                    config.cache.max_bytes = parse_number(key, value)?;
                }
                ENV_CACHE_TTL_SECS => {
                    config.cache.positive_ttl_secs = parse_number(key, value)?;
                }
                _ => {
                    // Unknown or empty variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("PKGATE_") || key == ENV_PUBLIC_REGISTRY_URL)
            .collect()
    }
}

fn parse_number(key: &str, value: &str) -> ConfigResult<u64> {
    value.trim().parse().map_err(|e| GatewayError::ConfigValidation {
        field: key.to_string(),
        reason: format!("'{}' is not a number: {}", value, e),
    })
}
