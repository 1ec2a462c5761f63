//! pkgcdn.toml parsing and validation

use crate::ConfigResult;
use pkgcdn_core::error::CdnError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Complete server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the HTTP server listens on
    pub port: u16,

    /// Public origin used when rewriting bare module specifiers
    pub origin: String,

    /// Upstream registry settings
    pub registry: RegistrySection,

    /// Resolution cache settings
    pub cache: CacheSection,
}

/// Upstream registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Public npm registry base URL
    pub public_url: String,

    /// Private registry base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_url: Option<String>,

    /// Explicit port for the private registry, overriding the URL's port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_port: Option<u16>,

    /// Packages whose name contains any of these go to the private registry
    pub private_scopes: Vec<String>,

    /// How tarball file names are built on the private registry
    pub private_tarball_naming: TarballNaming,

    /// Retries for send-level failures on metadata requests
    pub retries: u32,
}

/// Tarball file name convention of an upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TarballNaming {
    /// `{name}/-/{basename}-{version}.tgz` (npm's layout)
    #[default]
    Basename,
    /// `{name}/-/{name}-{version}.tgz`
    FullName,
}

/// Resolution cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Maximum total size of cached keys and values
    pub capacity_bytes: usize,

    /// Lifetime of positive entries
    pub ttl_secs: u64,

    /// Negative entries live `ttl_secs * negative_ttl_multiplier`
    pub negative_ttl_multiplier: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8088,
            origin: "https://unpkg.com".to_string(),
            registry: RegistrySection::default(),
            cache: CacheSection::default(),
        }
    }
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            public_url: "https://registry.npmjs.org".to_string(),
            private_url: None,
            private_port: None,
            private_scopes: Vec::new(),
            private_tarball_naming: TarballNaming::Basename,
            retries: 2,
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            capacity_bytes: 40 * 1024 * 1024,
            ttl_secs: 60,
            negative_ttl_multiplier: 5,
        }
    }
}

impl CacheSection {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.saturating_mul(u64::from(self.negative_ttl_multiplier)))
    }
}

/// Parse TOML string to a validated ServerConfig
pub fn parse_server_toml(content: &str) -> ConfigResult<ServerConfig> {
    let config: ServerConfig = toml::from_str(content).map_err(|e| CdnError::ConfigParse {
        message: format!("TOML parsing error: {}", e),
    })?;

    validate_config(&config)?;

    Ok(config)
}

fn invalid(field: &str, reason: impl Into<String>) -> CdnError {
    CdnError::ConfigValidation {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn validate_url(field: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value).map_err(|e| invalid(field, format!("'{}' is not a URL: {}", value, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(field, format!("'{}' must use http or https", value)));
    }
    Ok(())
}

/// Validate configuration completeness
pub fn validate_config(config: &ServerConfig) -> ConfigResult<()> {
    validate_url("origin", &config.origin)?;
    validate_url("registry.public_url", &config.registry.public_url)?;

    match &config.registry.private_url {
        Some(url) => validate_url("registry.private_url", url)?,
        None if !config.registry.private_scopes.is_empty() => {
            return Err(invalid(
                "registry.private_url",
                "private_scopes are configured but no private registry URL is set",
            ));
        }
        None => {}
    }

    if config.registry.private_scopes.iter().any(|scope| scope.is_empty()) {
        return Err(invalid("registry.private_scopes", "scopes cannot be empty strings"));
    }

    if config.cache.capacity_bytes == 0 {
        return Err(invalid("cache.capacity_bytes", "cache capacity must be greater than zero"));
    }

    if config.cache.negative_ttl_multiplier < 1 {
        return Err(invalid("cache.negative_ttl_multiplier", "multiplier must be at least 1"));
    }

    Ok(())
}

/// Load and parse pkgcdn.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<ServerConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CdnError::io(format!("Failed to read {}", path), e))?;

    parse_server_toml(&content).map_err(|e| match e {
        CdnError::ConfigParse { message } => CdnError::ConfigParse {
            message: format!("In file {}: {}", path, message),
        },
        CdnError::ConfigValidation { field, reason } => CdnError::ConfigValidation {
            field,
            reason: format!("In file {}: {}", path, reason),
        },
        other => other,
    })
}
