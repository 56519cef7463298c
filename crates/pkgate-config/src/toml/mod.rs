//! pkgate.toml configuration parsing and validation

use std::time::Duration;
use serde::{Deserialize, Serialize};
use url::Url;
use pkgate_core::error::GatewayError;
use crate::ConfigResult;

/// Public registry used when nothing else is configured
pub const DEFAULT_PUBLIC_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Private registry used when nothing else is configured
pub const DEFAULT_PRIVATE_REGISTRY_URL: &str = "http://localhost:4873";

/// Complete pkgate.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Upstream registries and routing
    pub registry: RegistrySection,

    /// Metadata cache limits and TTLs
    pub cache: CacheSection,

    /// HTTP client and connection pool settings
    pub http: HttpSection,
}

/// Upstream registry section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySection {
    /// Internet-facing registry base URL
    pub public_url: String,

    /// Internal registry base URL, `scheme://host:port`
    pub private_url: String,

    /// Any package name containing one of these tokens is routed privately
    pub private_scopes: Vec<String>,

    /// Bearer token sent to the private registry only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_token: Option<String>,
}

/// Metadata cache section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    /// Upper bound on the serialized size of all entries, in bytes
    pub max_bytes: u64,

    /// Lifetime of a positive entry
    pub positive_ttl_secs: u64,

    /// Negative entries live this many times longer than positive ones
    pub negative_ttl_factor: u32,
}

/// HTTP client section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSection {
    /// Whole-request timeout
    pub timeout_secs: u64,

    /// TCP/TLS connect timeout
    pub connect_timeout_secs: u64,

    /// How long an idle pooled connection is kept
    pub pool_idle_timeout_secs: u64,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,

    /// User agent sent upstream
    pub user_agent: String,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            public_url: DEFAULT_PUBLIC_REGISTRY_URL.to_string(),
            private_url: DEFAULT_PRIVATE_REGISTRY_URL.to_string(),
            private_scopes: Vec::new(),
            private_token: None,
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_bytes: 40 * 1024 * 1024,
            positive_ttl_secs: 60,
            negative_ttl_factor: 5,
        }
    }
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 50,
            user_agent: concat!("pkgate/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl RegistrySection {
    /// Port of the private registry.
    ///
    /// Taken from the text after the last `:` of the private URL. When that
    /// text is not a port (no explicit port in the URL) the scheme default is
    /// used instead.
    pub fn private_port(&self) -> ConfigResult<u16> {
        let last = self.private_url.rsplit(':').next().unwrap_or_default();
        let digits = last.split('/').next().unwrap_or_default();

        if let Ok(port) = digits.parse::<u16>() {
            return Ok(port);
        }

        parse_url("registry.private_url", &self.private_url)?
            .port_or_known_default()
            .ok_or_else(|| GatewayError::ConfigValidation {
                field: "registry.private_url".to_string(),
                reason: format!("cannot determine a port for '{}'", self.private_url),
            })
    }
}

impl CacheSection {
    /// TTL for entries describing something that exists upstream
    pub fn positive_ttl(&self) -> Duration {
        Duration::from_secs(self.positive_ttl_secs)
    }

    /// TTL for entries recording that something does not exist upstream
    pub fn negative_ttl(&self) -> Duration {
        self.positive_ttl() * self.negative_ttl_factor
    }
}

impl HttpSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

/// Parse TOML string to GatewayConfig
pub fn parse_gateway_toml(content: &str) -> ConfigResult<GatewayConfig> {
    let config: GatewayConfig = ::toml::from_str(content)
        .map_err(|e| GatewayError::ConfigParse { message: e.to_string() })?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize GatewayConfig to TOML string
pub fn serialize_gateway_toml(config: &GatewayConfig) -> ConfigResult<String> {
    ::toml::to_string_pretty(config)
        .map_err(|e| GatewayError::ConfigParse { message: format!("TOML serialization error: {}", e) })
}

/// Validate configuration completeness
pub fn validate_config(config: &GatewayConfig) -> ConfigResult<()> {
    parse_url("registry.public_url", &config.registry.public_url)?;
    parse_url("registry.private_url", &config.registry.private_url)?;
    config.registry.private_port()?;

    if config.registry.private_scopes.iter().any(|scope| scope.trim().is_empty()) {
        return Err(GatewayError::ConfigValidation {
            field: "registry.private_scopes".to_string(),
            reason: "scope tokens must not be empty".to_string(),
        });
    }

    if config.cache.max_bytes == 0 {
        return Err(GatewayError::ConfigValidation {
            field: "cache.max_bytes".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    if config.cache.positive_ttl_secs == 0 {
        return Err(GatewayError::ConfigValidation {
            field: "cache.positive_ttl_secs".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    // Negative entries must outlive positive ones.
    if config.cache.negative_ttl_factor < 2 {
        return Err(GatewayError::ConfigValidation {
            field: "cache.negative_ttl_factor".to_string(),
            reason: "must be at least 2".to_string(),
        });
    }

    if config.http.timeout_secs == 0 {
        return Err(GatewayError::ConfigValidation {
            field: "http.timeout_secs".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(())
}

/// Load and parse pkgate.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<GatewayConfig> {
    let content = tokio::fs::read_to_string(path).await
        .map_err(|e| GatewayError::io(format!("Failed to read {}", path), e))?;

    parse_gateway_toml(&content)
        .map_err(|e| match e {
            GatewayError::ConfigParse { message } => GatewayError::ConfigParse {
                message: format!("In file {}: {}", path, message),
            },
            other => other,
        })
}

fn parse_url(field: &str, value: &str) -> ConfigResult<Url> {
    let url = Url::parse(value).map_err(|e| GatewayError::ConfigValidation {
        field: field.to_string(),
        reason: format!("'{}' is not a valid URL: {}", value, e),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayError::ConfigValidation {
            field: field.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(url)
}
