//! Cache-through package lookups
//!
//! Two keyspaces live in the shared cache: `versions-{name}` holds the
//! published versions and dist-tags of a package, `config-{name}-{version}`
//! holds the cleaned manifest of one version. Lookups that find nothing are
//! recorded as negative entries with a longer TTL.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::api::VersionsAndTags;
use crate::cache::{CacheLookup, ResolutionCache};
use crate::client::{ByteStream, RegistryClient};
use crate::RegistryResult;
use pkgcdn_config::CacheSection;
use pkgcdn_core::types::PackageConfig;

/// Registry metadata access shared by all requests
#[derive(Debug, Clone)]
pub struct PackageRegistry {
    client: RegistryClient,
    cache: Arc<ResolutionCache>,
    ttl: Duration,
    negative_ttl: Duration,
}

impl PackageRegistry {
    /// Build a registry from a client and cache settings
    pub fn new(client: RegistryClient, cache_config: &CacheSection) -> Self {
        Self {
            client,
            cache: Arc::new(ResolutionCache::new(cache_config.capacity_bytes)),
            ttl: cache_config.ttl(),
            negative_ttl: cache_config.negative_ttl(),
        }
    }

    pub fn client(&self) -> &RegistryClient {
        &self.client
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Published versions and dist-tags; `None` when the package is unknown
    pub async fn get_versions_and_tags(&self, package_name: &str) -> RegistryResult<Option<VersionsAndTags>> {
        let key = format!("versions-{}", package_name);

        match self.cache.get::<VersionsAndTags>(&key) {
            CacheLookup::Hit(value) => return Ok(Some(value)),
            CacheLookup::Negative => {
                debug!(package = package_name, "negative cache hit for versions");
                return Ok(None);
            }
            CacheLookup::Miss => {}
        }

        match self.client.fetch_package_info(package_name).await? {
            Some(info) => {
                let value = info.versions_and_tags();
                self.cache.set(&key, &value, self.ttl)?;
                Ok(Some(value))
            }
            None => {
                self.cache.set_negative(&key, self.negative_ttl);
                Ok(None)
            }
        }
    }

    /// Cleaned manifest of one version; `None` when the version has none
    pub async fn get_package_config(&self, package_name: &str, version: &str) -> RegistryResult<Option<PackageConfig>> {
        let key = format!("config-{}-{}", package_name, version);

        match self.cache.get::<PackageConfig>(&key) {
            CacheLookup::Hit(value) => return Ok(Some(value)),
            CacheLookup::Negative => {
                debug!(package = package_name, version, "negative cache hit for config");
                return Ok(None);
            }
            CacheLookup::Miss => {}
        }

        let config = self
            .client
            .fetch_package_info(package_name)
            .await?
            .and_then(|info| info.into_version_manifest(version))
            .and_then(PackageConfig::from_manifest);

        match config {
            Some(config) => {
                self.cache.set(&key, &config, self.ttl)?;
                Ok(Some(config))
            }
            None => {
                self.cache.set_negative(&key, self.negative_ttl);
                Ok(None)
            }
        }
    }

    /// Open a version's tarball; never cached
    pub async fn get_tarball_stream(&self, package_name: &str, version: &str) -> RegistryResult<Option<ByteStream>> {
        self.client.fetch_tarball_stream(package_name, version).await
    }
}
