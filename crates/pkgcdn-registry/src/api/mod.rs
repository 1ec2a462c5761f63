//! npm registry API response types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Package document (packument) returned by `GET /{name}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageInfo {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,
    /// Tag name to version, e.g. `latest -> 4.17.21`
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: HashMap<String, String>,
    /// Raw `package.json` of every published version
    #[serde(default)]
    pub versions: HashMap<String, Value>,
}

/// The subset of a packument needed for version resolution
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct VersionsAndTags {
    /// Every published version
    pub versions: Vec<String>,
    /// dist-tags
    pub tags: HashMap<String, String>,
}

impl PackageInfo {
    /// Extract published versions and dist-tags
    pub fn versions_and_tags(&self) -> VersionsAndTags {
        let mut versions: Vec<String> = self.versions.keys().cloned().collect();
        versions.sort();
        VersionsAndTags {
            versions,
            tags: self.dist_tags.clone(),
        }
    }

    /// Take the manifest of one version out of the document
    pub fn into_version_manifest(mut self, version: &str) -> Option<Value> {
        self.versions.remove(version)
    }
}

impl VersionsAndTags {
    /// Whether `version` is exactly a published version
    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }

    /// Target of a dist-tag, if the tag exists
    pub fn tag(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }
}
