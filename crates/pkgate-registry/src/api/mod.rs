//! npm registry document types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Manifest keys dropped from a package config. There are probably more.
pub const EXCLUDED_CONFIG_KEYS: &[&str] = &[
    "browserify",
    "bugs",
    "directories",
    "engines",
    "files",
    "homepage",
    "keywords",
    "maintainers",
    "scripts",
];

/// Manifest keys starting with this prefix are registry-internal (`_id`, `_npmUser`, ...)
pub const INTERNAL_KEY_PREFIX: char = '_';

/// Package document as returned by `GET <registry>/<name>`.
///
/// Only the fields the gateway reads are kept; everything else in the
/// document is ignored on parse.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PackageInfoDoc {
    /// Package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tag name to version, passed through as published
    #[serde(rename = "dist-tags", default, skip_serializing_if = "Option::is_none")]
    pub dist_tags: Option<Map<String, Value>>,
    /// Version string to per-version manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Map<String, Value>>,
}

/// Published versions and dist-tags of a package
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionsAndTags {
    pub versions: Vec<String>,
    pub tags: Map<String, Value>,
}

/// A single version's manifest, minus build, CI, docs and internal keys
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PackageConfig(Map<String, Value>);

impl PackageInfoDoc {
    /// Versions and tags view; `None` when the document lists no versions
    pub fn versions_and_tags(&self) -> Option<VersionsAndTags> {
        let versions = self.versions.as_ref()?;
        Some(VersionsAndTags {
            versions: versions.keys().cloned().collect(),
            tags: self.dist_tags.clone().unwrap_or_default(),
        })
    }

    /// Raw manifest for one version
    pub fn version_manifest(&self, version: &str) -> Option<&Value> {
        self.versions.as_ref()?.get(version)
    }
}

impl VersionsAndTags {
    /// Version a dist-tag points at, if the tag holds a string
    pub fn tag(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).and_then(Value::as_str)
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }
}

impl PackageConfig {
    /// Build a config from a manifest, dropping excluded and internal keys
    pub fn from_manifest(manifest: &Map<String, Value>) -> Self {
        let kept = manifest
            .iter()
            .filter(|(key, _)| is_kept_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self(kept)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn is_kept_key(key: &str) -> bool {
    !key.starts_with(INTERNAL_KEY_PREFIX) && !EXCLUDED_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> PackageInfoDoc {
        serde_json::from_value(json!({
            "_id": "left-pad",
            "name": "left-pad",
            "readme": "ignored",
            "dist-tags": { "latest": "1.3.0", "next": "2.0.0-beta.1" },
            "versions": {
                "1.3.0": {
                    "name": "left-pad",
                    "version": "1.3.0",
                    "main": "index.js",
                    "scripts": { "test": "node test" },
                    "keywords": ["pad"],
                    "_npmUser": { "name": "someone" },
                    "_id": "left-pad@1.3.0",
                    "dist": { "tarball": "https://example/left-pad-1.3.0.tgz" }
                },
                "2.0.0-beta.1": { "name": "left-pad", "version": "2.0.0-beta.1" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_versions_and_tags() {
        let view = sample_doc().versions_and_tags().unwrap();

        let mut versions = view.versions.clone();
        versions.sort();
        assert_eq!(versions, vec!["1.3.0", "2.0.0-beta.1"]);
        assert_eq!(view.tag("latest"), Some("1.3.0"));
        assert!(view.contains("2.0.0-beta.1"));
        assert!(!view.contains("9.9.9"));
    }

    #[test]
    fn test_missing_versions_means_no_view() {
        let doc: PackageInfoDoc = serde_json::from_value(json!({ "name": "ghost" })).unwrap();
        assert!(doc.versions_and_tags().is_none());

        let doc: PackageInfoDoc = serde_json::from_value(json!({ "versions": null })).unwrap();
        assert!(doc.versions_and_tags().is_none());
    }

    #[test]
    fn test_missing_dist_tags_gives_empty_tags() {
        let doc: PackageInfoDoc = serde_json::from_value(json!({ "versions": { "1.0.0": {} } })).unwrap();
        let view = doc.versions_and_tags().unwrap();
        assert_eq!(view.versions, vec!["1.0.0"]);
        assert!(view.tags.is_empty());
    }

    #[test]
    fn test_non_string_dist_tag_is_kept() {
        let doc: PackageInfoDoc = serde_json::from_value(json!({
            "dist-tags": { "latest": "1.0.0", "weird": { "not": "a version" }, "count": 3 },
            "versions": { "1.0.0": {} }
        }))
        .unwrap();

        let view = doc.versions_and_tags().unwrap();
        assert_eq!(view.tag("latest"), Some("1.0.0"));
        assert_eq!(view.tag("weird"), None);
        assert_eq!(view.tags.get("weird"), Some(&json!({ "not": "a version" })));
        assert_eq!(view.tags.get("count"), Some(&json!(3)));
    }

    #[test]
    fn test_package_config_filters_keys() {
        let doc = sample_doc();
        let manifest = doc.version_manifest("1.3.0").unwrap().as_object().unwrap();
        let config = PackageConfig::from_manifest(manifest);

        assert_eq!(config.get("main"), Some(&json!("index.js")));
        assert!(config.contains_key("dist"));
        assert!(config.contains_key("version"));
        assert!(!config.contains_key("scripts"));
        assert!(!config.contains_key("keywords"));
        assert!(!config.contains_key("_npmUser"));
        assert!(!config.contains_key("_id"));
    }

    #[test]
    fn test_every_excluded_key_is_dropped() {
        let mut manifest = Map::new();
        for key in EXCLUDED_CONFIG_KEYS {
            manifest.insert(key.to_string(), json!(true));
        }
        manifest.insert("_internal".to_string(), json!(1));
        manifest.insert("license".to_string(), json!("MIT"));

        let config = PackageConfig::from_manifest(&manifest);
        assert_eq!(config.as_map().len(), 1);
        assert_eq!(config.get("license"), Some(&json!("MIT")));
    }

    #[test]
    fn test_package_config_serializes_as_plain_object() {
        let mut manifest = Map::new();
        manifest.insert("name".to_string(), json!("x"));
        let config = PackageConfig::from_manifest(&manifest);

        assert_eq!(serde_json::to_value(&config).unwrap(), json!({ "name": "x" }));
    }
}
