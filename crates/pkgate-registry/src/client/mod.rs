//! HTTP client with one keep-alive connection pool per registry class

use reqwest::{Client, ClientBuilder, Response, StatusCode};

use pkgate_config::{HttpSection, RegistrySection};
use pkgate_core::error::GatewayError;
use pkgate_core::types::{PackageName, RegistryClass};
use crate::api::PackageInfoDoc;
use crate::log::RequestLogger;
use crate::tarball::TarballStream;
use crate::upstream::UpstreamTarget;
use crate::RegistryResult;

/// Authentication configuration for registry access
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Bearer token sent as `Authorization: Bearer <token>`
    pub token: String,
}

impl AuthConfig {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

/// Registry HTTP client.
///
/// Private and public registries each get their own pool so private traffic
/// never rides on a public connection. Clones share both pools.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Pool for the internal registry
    private: Client,
    /// Pool for the internet-facing registry
    public: Client,
}

impl RegistryClient {
    /// Create registry client with default HTTP settings and no auth
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(&HttpSection::default(), None)
    }

    /// Create registry client from the gateway configuration
    pub fn from_config(http: &HttpSection, registry: &RegistrySection) -> RegistryResult<Self> {
        let private_auth = registry.private_token.clone().map(AuthConfig::bearer);
        Self::with_config(http, private_auth)
    }

    /// Create registry client; `private_auth` only applies to the private pool
    pub fn with_config(http: &HttpSection, private_auth: Option<AuthConfig>) -> RegistryResult<Self> {
        Ok(Self {
            private: Self::build_pool(http, private_auth)?,
            public: Self::build_pool(http, None)?,
        })
    }

    fn build_pool(http: &HttpSection, auth: Option<AuthConfig>) -> RegistryResult<Client> {
        let mut builder = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(http.pool_max_idle_per_host)
            .pool_idle_timeout(http.pool_idle_timeout())
            .tcp_keepalive(http.pool_idle_timeout())
            // Timeouts
            .timeout(http.timeout())
            .connect_timeout(http.connect_timeout())
            .user_agent(http.user_agent.clone());

        // Configure authentication if provided
        if let Some(auth_config) = auth {
            builder = builder.default_headers(auth_headers(format!("Bearer {}", auth_config.token))?);
        }

        builder.build()
            .map_err(|e| GatewayError::network("Failed to create HTTP client".to_string(), e))
    }

    /// Connection pool serving a registry class
    pub fn pool(&self, class: RegistryClass) -> &Client {
        match class {
            RegistryClass::Private => &self.private,
            RegistryClass::Public => &self.public,
        }
    }

    /// Fetch the full package document.
    ///
    /// `Ok(None)` on 404. Any other non-200 status, a network failure or an
    /// unparseable body is logged and returned as an error.
    pub async fn fetch_metadata(
        &self,
        name: &PackageName,
        target: &UpstreamTarget,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<PackageInfoDoc>> {
        log.debug(&format!("Fetching package info for {} from {}", name, target.url()));

        let response = self
            .send(target, true)
            .await
            .map_err(|e| log_failure(log, &format!("Error fetching info for {}", name), e))?;

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await.map_err(|e| {
                    log_failure(
                        log,
                        &format!("Error reading info for {}", name),
                        GatewayError::network(format!("Failed to read metadata for {}", name), e),
                    )
                })?;

                let doc = serde_json::from_slice::<PackageInfoDoc>(&body).map_err(|e| {
                    log_failure(
                        log,
                        &format!("Error parsing info for {}", name),
                        GatewayError::MalformedDocument {
                            package: name.to_string(),
                            message: e.to_string(),
                        },
                    )
                })?;

                Ok(Some(doc))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let context = format!("Error fetching info for {} (status: {})", name, status.as_u16());
                Err(upstream_status(log, name.as_str(), &context, response).await)
            }
        }
    }

    /// Fetch a tarball and return its decompressed byte stream.
    ///
    /// Same status handling as [`RegistryClient::fetch_metadata`]; the body
    /// is not read here, only wrapped.
    pub async fn fetch_tarball(
        &self,
        name: &PackageName,
        version: &str,
        target: &UpstreamTarget,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<TarballStream>> {
        log.debug(&format!("Fetching package for {} from {}", name, target.url()));

        let response = self
            .send(target, false)
            .await
            .map_err(|e| log_failure(log, &format!("Error fetching tarball for {}@{}", name, version), e))?;

        match response.status() {
            StatusCode::OK => Ok(Some(TarballStream::from_response(format!("{}@{}", name, version), response))),
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let context = format!(
                    "Error fetching tarball for {}@{} (status: {})",
                    name,
                    version,
                    status.as_u16()
                );
                Err(upstream_status(log, &format!("{}@{}", name, version), &context, response).await)
            }
        }
    }

    async fn send(&self, target: &UpstreamTarget, json: bool) -> RegistryResult<Response> {
        let mut request = self.pool(target.class()).get(target.url().clone());
        if json {
            request = request.header(reqwest::header::ACCEPT, "application/json");
        }

        request
            .send()
            .await
            .map_err(|e| GatewayError::network(format!("Request to {} failed", target.url()), e))
    }
}

fn auth_headers(value: String) -> RegistryResult<reqwest::header::HeaderMap> {
    let mut headers = reqwest::header::HeaderMap::new();
    let mut value: reqwest::header::HeaderValue = value
        .parse()
        .map_err(|e| GatewayError::ConfigValidation {
            field: "registry.private_token".to_string(),
            reason: format!("Invalid auth header: {}", e),
        })?;
    value.set_sensitive(true);
    headers.insert(reqwest::header::AUTHORIZATION, value);
    Ok(headers)
}

fn log_failure(log: &dyn RequestLogger, context: &str, error: GatewayError) -> GatewayError {
    log.error(&format!("{}: {}", context, error));
    error
}

/// Capture the body of an unexpected response as diagnostic text
async fn upstream_status(
    log: &dyn RequestLogger,
    package: &str,
    context: &str,
    response: Response,
) -> GatewayError {
    let status = response.status().as_u16();
    let body = match response.text().await {
        Ok(text) => text,
        Err(e) => format!("<unreadable body: {}>", e),
    };

    log.error(context);
    log.error(&body);

    GatewayError::UpstreamStatus {
        package: package.to_string(),
        status,
        body,
    }
}
