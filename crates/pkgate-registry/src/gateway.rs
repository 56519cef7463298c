//! Gateway façade over the metadata and tarball resolvers

use std::sync::Arc;

use pkgate_config::GatewayConfig;
use pkgate_core::types::PackageName;
use crate::api::{PackageConfig, VersionsAndTags};
use crate::cache::ResponseCache;
use crate::client::RegistryClient;
use crate::log::RequestLogger;
use crate::metadata::MetadataResolver;
use crate::tarball::{TarballResolver, TarballStream};
use crate::upstream::UpstreamSelector;
use crate::RegistryResult;

/// Caching gateway in front of the private and public registries.
///
/// Cheap to clone; clones share the connection pools and the cache.
#[derive(Debug, Clone)]
pub struct Gateway {
    selector: Arc<UpstreamSelector>,
    cache: Arc<ResponseCache>,
    metadata: MetadataResolver,
    tarballs: TarballResolver,
}

impl Gateway {
    /// Build a gateway from validated configuration
    pub fn from_config(config: &GatewayConfig) -> RegistryResult<Self> {
        let selector = UpstreamSelector::from_config(&config.registry)?;
        let client = RegistryClient::from_config(&config.http, &config.registry)?;
        let cache = ResponseCache::from_config(&config.cache);

        Ok(Self::new(selector, client, cache))
    }

    pub fn new(selector: UpstreamSelector, client: RegistryClient, cache: ResponseCache) -> Self {
        let selector = Arc::new(selector);
        let client = Arc::new(client);
        let cache = Arc::new(cache);

        Self {
            metadata: MetadataResolver::new(Arc::clone(&selector), Arc::clone(&client), Arc::clone(&cache)),
            tarballs: TarballResolver::new(Arc::clone(&selector), client),
            selector,
            cache,
        }
    }

    /// See [`MetadataResolver::get_versions_and_tags`]
    pub async fn get_versions_and_tags(
        &self,
        name: &PackageName,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<VersionsAndTags>> {
        self.metadata.get_versions_and_tags(name, log).await
    }

    /// See [`MetadataResolver::get_package_config`]
    pub async fn get_package_config(
        &self,
        name: &PackageName,
        version: &str,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<PackageConfig>> {
        self.metadata.get_package_config(name, version, log).await
    }

    /// See [`TarballResolver::get_package`]
    pub async fn get_package(
        &self,
        name: &PackageName,
        version: &str,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<TarballStream>> {
        self.tarballs.get_package(name, version, log).await
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn selector(&self) -> &UpstreamSelector {
        &self.selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pkgate_core::types::RegistryClass;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::log::RecordingLogger;
    use crate::testing::{config_for, package_doc, tarball_bytes};

    #[tokio::test]
    async fn test_gateway_from_config() {
        let public = MockServer::start().await;
        let private = MockServer::start().await;

        let gateway = Gateway::from_config(&config_for(&public, &private)).unwrap();

        let name: PackageName = "@corp/ui".parse().unwrap();
        assert_eq!(gateway.selector().classify(&name), RegistryClass::Private);
        assert_eq!(gateway.cache().policy().max_bytes, 40 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_gateway_rejects_invalid_registry_url() {
        let mut config = GatewayConfig::default();
        config.registry.public_url = "not a url".to_string();

        assert!(Gateway::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_clones_share_the_cache() {
        let public = MockServer::start().await;
        let private = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/lodash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(package_doc("lodash", &["4.17.21"])))
            .expect(1)
            .mount(&public)
            .await;

        let gateway = Gateway::from_config(&config_for(&public, &private)).unwrap();
        let other = gateway.clone();
        let log = RecordingLogger::default();
        let name: PackageName = "lodash".parse().unwrap();

        let first = gateway.get_versions_and_tags(&name, &log).await.unwrap();
        let second = other.get_versions_and_tags(&name, &log).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(other.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_full_install_flow() {
        let public = MockServer::start().await;
        let private = MockServer::start().await;
        let (gzipped, raw) = tarball_bytes(r#"{"name":"lodash","version":"4.17.21"}"#);

        Mock::given(method("GET"))
            .and(path("/lodash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(package_doc("lodash", &["4.17.21"])))
            .mount(&public)
            .await;

        Mock::given(method("GET"))
            .and(path("/lodash/-/lodash-4.17.21.tgz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(gzipped))
            .expect(1)
            .mount(&public)
            .await;

        let gateway = Gateway::from_config(&config_for(&public, &private)).unwrap();
        let log = RecordingLogger::default();
        let name: PackageName = "lodash".parse().unwrap();

        let tags = gateway.get_versions_and_tags(&name, &log).await.unwrap().unwrap();
        let latest = tags.tag("latest").unwrap().to_string();

        let config = gateway.get_package_config(&name, &latest, &log).await.unwrap().unwrap();
        assert_eq!(config.get("version"), Some(&serde_json::json!("4.17.21")));

        let stream = gateway.get_package(&name, &latest, &log).await.unwrap().unwrap();
        assert_eq!(stream.read_to_end().await.unwrap(), raw);
    }
}
