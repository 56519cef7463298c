//! Cached metadata resolution

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use pkgate_core::error::GatewayError;
use pkgate_core::types::PackageName;
use crate::api::{PackageConfig, PackageInfoDoc, VersionsAndTags};
use crate::cache::{CachedValue, ResponseCache};
use crate::client::RegistryClient;
use crate::log::RequestLogger;
use crate::upstream::UpstreamSelector;
use crate::RegistryResult;

/// Answers version-listing and manifest queries through the shared cache.
///
/// Every miss fetches the whole package document once; only the derived
/// view is cached. Concurrent misses for one key are not deduplicated and
/// the last write wins.
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    selector: Arc<UpstreamSelector>,
    client: Arc<RegistryClient>,
    cache: Arc<ResponseCache>,
}

impl MetadataResolver {
    pub fn new(
        selector: Arc<UpstreamSelector>,
        client: Arc<RegistryClient>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self { selector, client, cache }
    }

    /// Published versions and dist-tags of a package.
    ///
    /// `Ok(None)` when the package does not exist or lists no versions.
    pub async fn get_versions_and_tags(
        &self,
        name: &PackageName,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<VersionsAndTags>> {
        let key = format!("versions-{}", name);

        self.cached(key, move || async move {
            let info = self.fetch_package_info(name, log).await?;
            Ok(info.and_then(|doc| doc.versions_and_tags()))
        })
        .await
    }

    /// Manifest of one version with build, CI, docs and internal keys removed.
    ///
    /// `Ok(None)` when the package or the version does not exist.
    pub async fn get_package_config(
        &self,
        name: &PackageName,
        version: &str,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<PackageConfig>> {
        let key = format!("config-{}-{}", name, version);

        self.cached(key, move || async move {
            let Some(info) = self.fetch_package_info(name, log).await? else {
                return Ok(None);
            };

            match info.version_manifest(version) {
                None => Ok(None),
                Some(Value::Object(manifest)) => Ok(Some(PackageConfig::from_manifest(manifest))),
                Some(_) => {
                    let error = GatewayError::MalformedDocument {
                        package: name.to_string(),
                        message: format!("manifest for version {} is not an object", version),
                    };
                    log.error(&format!("Error reading config for {}@{}: {}", name, version, error));
                    Err(error)
                }
            }
        })
        .await
    }

    async fn fetch_package_info(
        &self,
        name: &PackageName,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<PackageInfoDoc>> {
        let class = self.selector.classify(name);
        let target = self.selector.metadata_target(name, class)?;
        self.client.fetch_metadata(name, &target, log).await
    }

    /// Serve `key` from the cache, or run `fetch` and remember its outcome.
    ///
    /// Found values and confirmed absences are cached with their own TTLs;
    /// errors are returned without touching the cache.
    async fn cached<T, F, Fut>(&self, key: String, fetch: F) -> RegistryResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = RegistryResult<Option<T>>>,
    {
        match self.cache.get(&key) {
            Some(CachedValue::Absent) => return Ok(None),
            Some(CachedValue::Present(json)) => match serde_json::from_str(&json) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cache entry"),
            },
            None => {}
        }

        match fetch().await? {
            Some(value) => {
                match serde_json::to_string(&value) {
                    Ok(json) => self.cache.insert_present(key, json),
                    Err(e) => warn!(key = %key, error = %e, "Not caching unserializable value"),
                }
                Ok(Some(value))
            }
            None => {
                self.cache.insert_absent(key);
                Ok(None)
            }
        }
    }
}
