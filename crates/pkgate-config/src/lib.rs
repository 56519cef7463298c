//! Configuration loading for the pkgate registry gateway
//!
//! This crate handles parsing and validation of pkgate.toml, layered with
//! environment overrides, producing the static configuration the registry
//! layer reads once at startup.

pub mod toml;
pub mod merge;

// Re-export main types
pub use crate::toml::{CacheSection, GatewayConfig, HttpSection, RegistrySection};
pub use crate::merge::{ConfigLoader, ConfigSource};

use pkgate_core::error::GatewayError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, GatewayError>;
