//! Error types and result aliases for pkgate operations.
//!
//! A single error type covers configuration, upstream and local I/O failures.
//! A package that does not exist upstream is not an error at the resolver
//! boundary; resolvers report it as `Ok(None)`.

use thiserror::Error;

/// Unified error type for all pkgate operations
#[derive(Error, Debug)]
pub enum GatewayError {
    // Config errors
    #[error("Failed to parse pkgate.toml: {message}")]
    ConfigParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Invalid package name '{name}': {reason}")]
    InvalidPackageName { name: String, reason: String },

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Registry returned status {status} for {package}")]
    UpstreamStatus {
        package: String,
        status: u16,
        body: String,
    },

    #[error("Malformed registry document for {package}: {message}")]
    MalformedDocument { package: String, message: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for pkgate operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Whether the upstream registry failed to give a usable answer
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::UpstreamStatus { .. }
                | GatewayError::MalformedDocument { .. }
                | GatewayError::Network { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            GatewayError::PackageNotFound { .. } => {
                Some("Check the package name and version spelling")
            },
            GatewayError::Network { .. } => {
                Some("Check that the registry is reachable from this host")
            },
            GatewayError::UpstreamStatus { .. } => {
                Some("The registry rejected the request; see the logged response body")
            },
            GatewayError::ConfigParse { .. } | GatewayError::ConfigValidation { .. } => {
                Some("Fix pkgate.toml or the PKGATE_* environment variables")
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_failures() {
        let status = GatewayError::UpstreamStatus {
            package: "react".to_string(),
            status: 503,
            body: "down".to_string(),
        };
        assert!(status.is_upstream_failure());
        assert_eq!(status.to_string(), "Registry returned status 503 for react");

        let io = GatewayError::io(
            "write failed".to_string(),
            std::io::Error::new(std::io::ErrorKind::Other, "disk"),
        );
        assert!(!io.is_upstream_failure());

        let missing = GatewayError::PackageNotFound { name: "nope".to_string() };
        assert!(!missing.is_upstream_failure());
        assert!(missing.suggestion().is_some());
    }

    #[test]
    fn test_network_error_keeps_source() {
        use std::error::Error as _;

        let err = GatewayError::network(
            "connect failed".to_string(),
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert!(err.source().is_some());
        assert!(err.is_upstream_failure());
    }
}
