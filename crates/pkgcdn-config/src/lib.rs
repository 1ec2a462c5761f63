//! Configuration loading for the pkgcdn gateway
//!
//! This crate parses and validates `pkgcdn.toml`, then layers environment
//! variables and command-line flags on top to produce a `ServerConfig`.

pub mod merge;
pub mod server;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use server::{CacheSection, RegistrySection, ServerConfig, TarballNaming};

use pkgcdn_core::error::CdnError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, CdnError>;
