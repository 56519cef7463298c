//! Tarball resolution.
//!
//! Tarballs are streamed straight from upstream and never cached; the
//! metadata cache already bounds how often clients reach this path for
//! packages that do not exist.

use std::sync::Arc;

use pkgate_core::types::PackageName;
use crate::client::RegistryClient;
use crate::log::RequestLogger;
use crate::upstream::UpstreamSelector;
use crate::RegistryResult;

pub mod decode;

// Re-export main types
pub use decode::TarballStream;

/// Resolves `name@version` to a decompressed tarball stream
#[derive(Debug, Clone)]
pub struct TarballResolver {
    selector: Arc<UpstreamSelector>,
    client: Arc<RegistryClient>,
}

impl TarballResolver {
    pub fn new(selector: Arc<UpstreamSelector>, client: Arc<RegistryClient>) -> Self {
        Self { selector, client }
    }

    /// Stream the decompressed tarball of one package version.
    ///
    /// `Ok(None)` when upstream has no such tarball. Upstream failures are
    /// logged and returned as errors without retrying.
    pub async fn get_package(
        &self,
        name: &PackageName,
        version: &str,
        log: &dyn RequestLogger,
    ) -> RegistryResult<Option<TarballStream>> {
        let class = self.selector.classify(name);
        let target = self.selector.tarball_target(name, version, class)?;
        self.client.fetch_tarball(name, version, &target, log).await
    }
}
