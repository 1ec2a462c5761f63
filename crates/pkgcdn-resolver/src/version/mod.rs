//! Requested version to published version

use tracing::debug;

use crate::semver::VersionSelector;
use crate::ResolverResult;
use pkgcdn_registry::{PackageRegistry, VersionsAndTags};

/// Resolves version requests against registry metadata
#[derive(Debug, Clone)]
pub struct VersionResolver {
    registry: PackageRegistry,
}

impl VersionResolver {
    pub fn new(registry: PackageRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    /// Resolve a version, range or dist-tag to a published version.
    /// `None` means the package is unknown or nothing matches.
    pub async fn resolve(&self, package_name: &str, range_or_tag: &str) -> ResolverResult<Option<String>> {
        let Some(summary) = self.registry.get_versions_and_tags(package_name).await? else {
            return Ok(None);
        };

        let resolved = resolve_in(&summary, range_or_tag);
        debug!(package = package_name, requested = range_or_tag, resolved = ?resolved, "resolved version");
        Ok(resolved)
    }

    /// Published versions in ascending semver order
    pub async fn available_versions(&self, package_name: &str) -> ResolverResult<Vec<String>> {
        let versions = self
            .registry
            .get_versions_and_tags(package_name)
            .await?
            .map(|summary| {
                VersionSelector::new(&summary.versions)
                    .sorted()
                    .into_iter()
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(versions)
    }
}

/// Tag substitution, then exact match, then highest satisfying version
pub fn resolve_in(summary: &VersionsAndTags, range_or_tag: &str) -> Option<String> {
    let range = summary.tag(range_or_tag).unwrap_or(range_or_tag);

    if summary.contains(range) {
        return Some(range.to_string());
    }

    VersionSelector::new(&summary.versions)
        .max_satisfying(range)
        .map(String::from)
}
