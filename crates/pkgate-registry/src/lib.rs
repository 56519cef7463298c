//! Caching gateway in front of private and public npm registries
//!
//! This crate answers three queries for package installers: the published
//! versions and dist-tags of a package, the trimmed manifest of one version,
//! and the decompressed tarball of one version. Each package is routed to the
//! private or the public registry by name; metadata answers, including
//! confirmed absences, are kept in a size-bounded TTL cache.

pub mod api;
pub mod cache;
pub mod client;
pub mod gateway;
pub mod log;
pub mod metadata;
pub mod tarball;
pub mod upstream;

#[cfg(test)]
mod testing;

// Re-export main types
pub use api::{PackageConfig, PackageInfoDoc, VersionsAndTags};
pub use cache::{CachePolicy, CacheStats, CachedValue, ResponseCache};
pub use client::{AuthConfig, RegistryClient};
pub use gateway::Gateway;
pub use log::{RequestLogger, TracingLogger};
pub use metadata::MetadataResolver;
pub use tarball::{TarballResolver, TarballStream};
pub use upstream::{UpstreamSelector, UpstreamTarget};

use pkgate_core::error::GatewayError;

/// Result type for registry operations.
///
/// `Ok(Some(_))` found, `Ok(None)` confirmed absent upstream, `Err(_)` the
/// upstream could not be consulted.
pub type RegistryResult<T> = Result<T, GatewayError>;
