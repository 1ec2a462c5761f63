//! Version and entry-point resolution for the pkgcdn gateway
//!
//! This crate maps a requested version, range or dist-tag onto a published
//! version, and picks the file a bare package URL should point at.

pub mod entry;
pub mod semver;
pub mod version;

// Re-export main types
pub use entry::{select_entry_point, EntryPoint};
pub use semver::VersionSelector;
pub use version::VersionResolver;

use pkgcdn_core::error::CdnError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, CdnError>;
