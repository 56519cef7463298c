//! Core data types for pkgate.
//!
//! - Package names as they appear in registry URLs
//! - Registry classes used to pick an upstream

pub mod package;
pub mod registry;

// Re-export all public types
pub use package::PackageName;
pub use registry::RegistryClass;
