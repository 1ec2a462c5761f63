//! Core data types for pkgcdn request handling.
//!
//! This module provides the fundamental types used throughout the gateway:
//! - Version types with npm range semantics
//! - Package specs and cleaned package configs
//! - Tarball entries and their metadata documents

pub mod entry;
pub mod package;
pub mod version;

// Re-export all public types
pub use entry::{EntryMetadata, EntryType, TarEntry};
pub use package::{PackageConfig, PackageSpec};
pub use version::{Comparator, Op, PartialVersion, Version, VersionError, VersionReq};
