//! Utility functions and helpers.
//!
//! Common functionality used across multiple pkgcdn crates.

pub mod content_type;
pub mod hash;
pub mod name;
pub mod path;

// Re-export commonly used utilities
pub use content_type::{content_type_for, content_type_header};
pub use hash::{etag, sri_sha384, IntegrityHasher};
pub use name::{is_hash, validate_package_name};
pub use path::{basename, collapse_slashes, dirname, extname, join, normalize_entry_path};
