//! Version selection over a package's published versions
//!
//! Published version strings are kept next to their parsed form so the
//! exact string the registry used is what gets returned.

use std::str::FromStr;

use pkgcdn_core::types::{Version, VersionReq};

/// Version selector for finding the best matching published version
#[derive(Debug, Clone)]
pub struct VersionSelector {
    /// Parsed versions with their original strings, ascending
    available_versions: Vec<(Version, String)>,
}

impl VersionSelector {
    /// Create a selector from published version strings. Strings that are
    /// not valid semver are ignored.
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut available_versions: Vec<(Version, String)> = versions
            .into_iter()
            .filter_map(|raw| {
                let raw = raw.as_ref();
                Version::from_str(raw).ok().map(|version| (version, raw.to_string()))
            })
            .collect();
        available_versions.sort_by(|a, b| a.0.cmp(&b.0));
        Self { available_versions }
    }

    /// Highest version satisfying a range string; `None` when the range
    /// does not parse or nothing satisfies it
    pub fn max_satisfying(&self, range: &str) -> Option<&str> {
        let req = VersionReq::parse(range).ok()?;
        self.select_best(&req)
    }

    /// Highest version matching a parsed requirement
    pub fn select_best(&self, req: &VersionReq) -> Option<&str> {
        self.available_versions
            .iter()
            .rev() // Start with highest versions
            .find(|(version, _)| req.matches(version))
            .map(|(_, raw)| raw.as_str())
    }

    /// Every valid published version, ascending
    pub fn sorted(&self) -> Vec<&str> {
        self.available_versions.iter().map(|(_, raw)| raw.as_str()).collect()
    }
}
