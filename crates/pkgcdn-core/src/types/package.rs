//! Package request and manifest types.
//!
//! `PackageSpec` is what a request URL asks for; `PackageConfig` is the
//! cleaned `package.json` of one published version.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Manifest keys that never influence resolution or module delivery
const STRIPPED_KEYS: &[&str] = &[
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

/// A package request: `name[@version][/filename]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Validated npm package name (may be scoped)
    pub name: String,
    /// Version, range or tag as written by the client (`latest` when omitted)
    pub requested: String,
    /// Exact published version, once resolved
    pub resolved: Option<String>,
    /// File path inside the package, always empty or starting with `/`
    pub filename: String,
}

impl PackageSpec {
    /// Create a spec for an unresolved request
    pub fn new(name: impl Into<String>, requested: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requested: requested.into(),
            resolved: None,
            filename: filename.into(),
        }
    }

    /// The version that should be used for lookups: resolved if known
    pub fn version(&self) -> &str {
        self.resolved.as_deref().unwrap_or(&self.requested)
    }

    /// Whether the client asked for exactly the version that was resolved
    pub fn is_canonical(&self) -> bool {
        self.resolved.as_deref() == Some(self.requested.as_str())
    }

    /// `name@version` as used in messages and cache keys
    pub fn spec(&self) -> String {
        format!("{}@{}", self.name, self.version())
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}{}", self.name, self.version(), self.filename)
    }
}

/// The cleaned `package.json` of a single published version
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageConfig {
    fields: Map<String, Value>,
}

impl PackageConfig {
    /// Build a config from a raw manifest, stripping private and
    /// build/docs-only keys. Returns `None` for non-object manifests.
    pub fn from_manifest(manifest: Value) -> Option<Self> {
        match manifest {
            Value::Object(map) => {
                let fields = map
                    .into_iter()
                    .filter(|(key, _)| !key.starts_with('_') && !STRIPPED_KEYS.contains(&key.as_str()))
                    .collect();
                Some(Self { fields })
            }
            _ => None,
        }
    }

    /// Raw field access
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// A field's value if it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// A non-empty string field
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|value| !value.is_empty())
    }

    pub fn main(&self) -> Option<&str> {
        self.non_empty("main")
    }

    pub fn module(&self) -> Option<&str> {
        self.non_empty("module")
    }

    pub fn jsnext_main(&self) -> Option<&str> {
        self.non_empty("jsnext:main")
    }

    /// `unpkg` field, only when it is a plain string
    pub fn unpkg(&self) -> Option<&str> {
        self.non_empty("unpkg")
    }

    /// `browser` field, only when it is a plain string (object maps are ignored)
    pub fn browser(&self) -> Option<&str> {
        self.non_empty("browser")
    }

    /// Whether the package declares `"type": "module"`
    pub fn is_module_type(&self) -> bool {
        self.get_str("type") == Some("module")
    }

    /// `peerDependencies` overlaid with `dependencies`; direct dependencies
    /// win when a package appears in both.
    pub fn merged_dependencies(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for key in ["peerDependencies", "dependencies"] {
            if let Some(Value::Object(deps)) = self.fields.get(key) {
                for (name, range) in deps {
                    if let Some(range) = range.as_str() {
                        merged.insert(name.clone(), range.to_string());
                    }
                }
            }
        }
        merged
    }
}
