//! # pkgcdn-core
//!
//! Core types and utilities shared across all pkgcdn crates.
//!
//! This crate provides:
//! - Version and VersionReq types following npm range semantics
//! - PackageSpec, PackageConfig and TarEntry types for request handling
//! - CdnError enum for unified error handling
//! - Hashing, content-type, path and package-name helpers
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, PackageSpec, TarEntry, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{CdnError, CdnResult};
pub use types::{EntryMetadata, EntryType, PackageConfig, PackageSpec, TarEntry, Version, VersionReq};
