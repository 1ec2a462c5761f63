//! npm registry access for the pkgcdn gateway
//!
//! This crate provides the HTTP client that talks to the public and private
//! upstream registries, the byte-bounded resolution cache, and the
//! cache-through package lookups built from the two.

pub mod api;
pub mod cache;
pub mod client;
pub mod packages;

// Re-export main types
pub use api::{PackageInfo, VersionsAndTags};
pub use cache::{CacheLookup, CacheStats, ResolutionCache};
pub use client::{ByteStream, RegistryClient, RetryConfig, Upstream};
pub use packages::PackageRegistry;

use pkgcdn_core::error::CdnError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, CdnError>;
