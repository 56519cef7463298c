//! Upstream selection: which registry owns a package, and the URL to ask it

use url::Url;

use pkgate_config::RegistrySection;
use pkgate_core::error::GatewayError;
use pkgate_core::types::{PackageName, RegistryClass};
use crate::RegistryResult;

/// A fully formed upstream request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// Which connection pool serves this target
    class: RegistryClass,
    /// Absolute URL, path already encoded
    url: Url,
}

impl UpstreamTarget {
    pub fn class(&self) -> RegistryClass {
        self.class
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Port the request will connect to, explicit or scheme default
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    /// Encoded request path
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// Routes package names to the private or public registry.
///
/// Pure computation over static configuration; no network or cache access.
#[derive(Debug, Clone)]
pub struct UpstreamSelector {
    /// Public registry base, no trailing slash
    public_base: String,
    /// Private registry base, no trailing slash
    private_base: String,
    /// Port every private request connects to
    private_port: u16,
    /// Substrings that mark a package as private
    private_scopes: Vec<String>,
}

impl UpstreamSelector {
    /// Create a selector from explicit values
    pub fn new(
        public_url: &str,
        private_url: &str,
        private_port: u16,
        private_scopes: Vec<String>,
    ) -> RegistryResult<Self> {
        Ok(Self {
            public_base: normalize_base("registry.public_url", public_url)?,
            private_base: normalize_base("registry.private_url", private_url)?,
            private_port,
            private_scopes,
        })
    }

    /// Create a selector from the registry configuration section
    pub fn from_config(config: &RegistrySection) -> RegistryResult<Self> {
        Self::new(
            &config.public_url,
            &config.private_url,
            config.private_port()?,
            config.private_scopes.clone(),
        )
    }

    /// Private iff the name contains any private scope token anywhere in it
    pub fn classify(&self, name: &PackageName) -> RegistryClass {
        let name = name.as_str();
        if self.private_scopes.iter().any(|scope| name.contains(scope.as_str())) {
            RegistryClass::Private
        } else {
            RegistryClass::Public
        }
    }

    /// Target for the full package document: `<base>/<encoded name>`
    pub fn metadata_target(&self, name: &PackageName, class: RegistryClass) -> RegistryResult<UpstreamTarget> {
        self.build(class, &name.encoded())
    }

    /// Target for a version's tarball: `<base>/<name>/-/<file>-<version>.tgz`.
    ///
    /// The private registry names the file after the full package name,
    /// the public registry after the name without its scope.
    pub fn tarball_target(
        &self,
        name: &PackageName,
        version: &str,
        class: RegistryClass,
    ) -> RegistryResult<UpstreamTarget> {
        let file = match class {
            RegistryClass::Private => name.as_str(),
            RegistryClass::Public => name.unscoped(),
        };
        self.build(class, &format!("{}/-/{}-{}.tgz", name, file, version))
    }

    pub fn private_scopes(&self) -> &[String] {
        &self.private_scopes
    }

    fn build(&self, class: RegistryClass, path: &str) -> RegistryResult<UpstreamTarget> {
        let base = match class {
            RegistryClass::Private => &self.private_base,
            RegistryClass::Public => &self.public_base,
        };

        let raw = format!("{}/{}", base, path);
        let mut url = Url::parse(&raw).map_err(|e| GatewayError::ConfigValidation {
            field: format!("registry.{}_url", class),
            reason: format!("cannot build request URL '{}': {}", raw, e),
        })?;

        if class == RegistryClass::Private {
            url.set_port(Some(self.private_port)).map_err(|_| GatewayError::ConfigValidation {
                field: "registry.private_url".to_string(),
                reason: format!("cannot set port {} on '{}'", self.private_port, raw),
            })?;
        }

        Ok(UpstreamTarget { class, url })
    }
}

fn normalize_base(field: &str, url: &str) -> RegistryResult<String> {
    let parsed = Url::parse(url).map_err(|e| GatewayError::ConfigValidation {
        field: field.to_string(),
        reason: format!("'{}' is not a valid URL: {}", url, e),
    })?;

    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        return Err(GatewayError::ConfigValidation {
            field: field.to_string(),
            reason: format!("'{}' has no host", url),
        });
    }

    Ok(url.trim_end_matches('/').to_string())
}
