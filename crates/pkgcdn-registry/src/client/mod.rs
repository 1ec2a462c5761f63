//! HTTP client for the upstream registries with connection pooling and retry logic

use std::time::Duration;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use tracing::{debug, error};
use url::Url;

use crate::api::PackageInfo;
use crate::RegistryResult;
use pkgcdn_config::{RegistrySection, TarballNaming};
use pkgcdn_core::error::CdnError;

/// Live, not yet buffered tarball body
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

/// Which upstream serves a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Public,
    Private,
}

/// Main HTTP client for registry operations
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Public registry base URL, without trailing slash
    public_url: String,
    /// Private registry base URL with the port override applied
    private_url: Option<String>,
    /// Name fragments routed to the private registry
    private_scopes: Vec<String>,
    /// Tarball naming on the private registry
    private_tarball_naming: TarballNaming,
}

impl RegistryClient {
    /// Create a registry client from configuration
    pub fn new(config: &RegistrySection) -> RegistryResult<Self> {
        let retry_config = RetryConfig {
            max_retries: config.retries,
            ..RetryConfig::default()
        };
        Self::with_retry_config(config, retry_config)
    }

    /// Create a registry client with custom retry behaviour
    pub fn with_retry_config(config: &RegistrySection, retry_config: RetryConfig) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            // Keep-alive connection pool shared by every request
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("pkgcdn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CdnError::network(format!("Failed to create HTTP client: {}", e), e))?;

        let private_url = config
            .private_url
            .as_deref()
            .map(|url| with_port_override(url, config.private_port))
            .transpose()?;

        Ok(Self {
            client,
            retry_config,
            public_url: config.public_url.trim_end_matches('/').to_string(),
            private_url,
            private_scopes: config.private_scopes.clone(),
            private_tarball_naming: config.private_tarball_naming,
        })
    }

    /// Pick the upstream for a package: private when its name contains any
    /// configured scope and a private registry exists.
    pub fn upstream_for(&self, package_name: &str) -> Upstream {
        let is_private = self.private_url.is_some()
            && self
                .private_scopes
                .iter()
                .any(|scope| package_name.contains(scope.as_str()));

        if is_private {
            Upstream::Private
        } else {
            Upstream::Public
        }
    }

    fn base_url(&self, upstream: Upstream) -> &str {
        match (upstream, &self.private_url) {
            (Upstream::Private, Some(url)) => url,
            _ => &self.public_url,
        }
    }

    /// Metadata document URL for a package
    pub fn package_info_url(&self, package_name: &str) -> String {
        let base = self.base_url(self.upstream_for(package_name));
        format!("{}/{}", base, encode_package_name(package_name))
    }

    /// Tarball URL for one version of a package
    pub fn tarball_url(&self, package_name: &str, version: &str) -> String {
        let upstream = self.upstream_for(package_name);
        let file_stem = match (upstream, self.private_tarball_naming) {
            (Upstream::Private, TarballNaming::FullName) => package_name,
            _ => tarball_basename(package_name),
        };
        format!(
            "{}/{}/-/{}-{}.tgz",
            self.base_url(upstream),
            package_name,
            file_stem,
            version
        )
    }

    /// Send a GET with exponential backoff. Only send-level failures are
    /// retried; any HTTP status is returned to the caller as is.
    async fn send_with_retry(&self, url: &str, accept: &str) -> RegistryResult<Response> {
        let mut delay = self.retry_config.initial_delay;
        let mut attempt = 0;

        loop {
            let result = self.client.get(url).header("Accept", accept).send().await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retry_config.max_retries => {
                    debug!(url, attempt, error = %e, "registry request failed, retrying");
                    attempt += 1;

                    // Wait before retry
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis((delay.as_millis() as f64 * self.retry_config.multiplier) as u64),
                        self.retry_config.max_delay,
                    );
                }
                Err(e) => return Err(CdnError::network(format!("Failed to fetch {}: {}", url, e), e)),
            }
        }
    }

    /// Log an unexpected upstream status together with its body
    async fn log_unexpected(&self, what: &str, package_name: &str, response: Response) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!(
            package = package_name,
            %status,
            body = %body,
            "Error fetching {} for {}",
            what,
            package_name
        );
    }

    /// Fetch the package document. `None` means the package does not exist
    /// upstream, or the upstream answered with an unexpected status.
    pub async fn fetch_package_info(&self, package_name: &str) -> RegistryResult<Option<PackageInfo>> {
        let url = self.package_info_url(package_name);
        debug!(package = package_name, url = %url, "Fetching package info");

        let response = self.send_with_retry(&url, "application/json").await?;

        match response.status() {
            StatusCode::OK => {
                let info = response
                    .json::<PackageInfo>()
                    .await
                    .map_err(|e| CdnError::network(format!("Failed to parse package info for {}: {}", package_name, e), e))?;
                Ok(Some(info))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => {
                self.log_unexpected("package info", package_name, response).await;
                Ok(None)
            }
        }
    }

    /// Open the tarball of a version as a live byte stream
    pub async fn fetch_tarball_stream(&self, package_name: &str, version: &str) -> RegistryResult<Option<ByteStream>> {
        let url = self.tarball_url(package_name, version);
        debug!(package = package_name, version, url = %url, "Fetching package tarball");

        let response = self.send_with_retry(&url, "application/octet-stream").await?;

        match response.status() {
            StatusCode::OK => {
                let stream = response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)))
                    .boxed();
                Ok(Some(stream))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => {
                self.log_unexpected("tarball", package_name, response).await;
                Ok(None)
            }
        }
    }
}

/// Apply an explicit port to a registry base URL
fn with_port_override(base: &str, port: Option<u16>) -> RegistryResult<String> {
    let mut url = Url::parse(base).map_err(|e| CdnError::ConfigValidation {
        field: "registry.private_url".to_string(),
        reason: format!("'{}' is not a URL: {}", base, e),
    })?;

    if let Some(port) = port {
        url.set_port(Some(port)).map_err(|_| CdnError::ConfigValidation {
            field: "registry.private_port".to_string(),
            reason: format!("cannot set a port on '{}'", base),
        })?;
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Encode package name for URL (`@scope/pkg` becomes `@scope%2Fpkg`)
fn encode_package_name(name: &str) -> String {
    match name.strip_prefix('@') {
        Some(rest) => format!("@{}", rest.replace('/', "%2F")),
        None => name.to_string(),
    }
}

/// Tarball file stem on npm: the unscoped part of the name
fn tarball_basename(name: &str) -> &str {
    if name.starts_with('@') {
        name.split_once('/').map_or(name, |(_, base)| base)
    } else {
        name
    }
}

#[cfg(test)]
mod tests;
