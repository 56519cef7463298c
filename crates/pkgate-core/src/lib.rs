//! # pkgate-core
//!
//! Core types and errors shared across all pkgate crates.
//!
//! This crate provides:
//! - `PackageName` with npm scope handling and URL path encoding
//! - `RegistryClass` for routing a package to the private or public registry
//! - `GatewayError` enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (PackageName, RegistryClass)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{GatewayError, GatewayResult};
pub use types::{PackageName, RegistryClass};
