//! Shared fixtures for unit tests

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use wiremock::MockServer;

use pkgate_config::GatewayConfig;
use crate::upstream::UpstreamSelector;

pub(crate) const PRIVATE_SCOPE: &str = "@corp";

/// Config routing `@corp` packages to `private` and everything else to `public`
pub(crate) fn config_for(public: &MockServer, private: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.registry.public_url = public.uri();
    config.registry.private_url = private.uri();
    config.registry.private_scopes = vec![PRIVATE_SCOPE.to_string()];
    config
}

pub(crate) fn selector_for(public: &MockServer, private: &MockServer) -> UpstreamSelector {
    UpstreamSelector::from_config(&config_for(public, private).registry).unwrap()
}

/// Minimal registry document with the given versions, `latest` on the last one
pub(crate) fn package_doc(name: &str, versions: &[&str]) -> Value {
    let mut manifests = serde_json::Map::new();
    for version in versions {
        manifests.insert(
            version.to_string(),
            json!({
                "name": name,
                "version": version,
                "main": "index.js",
                "license": "MIT",
                "scripts": { "test": "jest" },
                "homepage": "https://example.com",
                "_id": format!("{}@{}", name, version),
                "_shasum": "abc",
                "dist": { "tarball": format!("https://example.com/{}-{}.tgz", name, version) }
            }),
        );
    }

    json!({
        "_id": name,
        "name": name,
        "dist-tags": { "latest": versions.last().copied().unwrap_or_default() },
        "versions": manifests,
        "time": { "created": "2024-01-01T00:00:00.000Z" }
    })
}

/// A real npm-style .tgz holding `package/package.json`
pub(crate) fn tarball_bytes(package_json: &str) -> (Vec<u8>, Vec<u8>) {
    let mut tar_data = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_data);
        let mut header = tar::Header::new_gnu();
        header.set_path("package/package.json").unwrap();
        header.set_size(package_json.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, package_json.as_bytes()).unwrap();
        builder.finish().unwrap();
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_data).unwrap();
    let gzipped = encoder.finish().unwrap();

    (gzipped, tar_data)
}
