//! Error types and result aliases for pkgcdn operations.
//!
//! Expected request outcomes (403, 404, redirects) are not errors; they are
//! returned as values by the request pipeline. This enum covers everything
//! that can go wrong while producing those values.

use thiserror::Error;

/// Unified error type for all pkgcdn operations
#[derive(Error, Debug)]
pub enum CdnError {
    // Request errors
    #[error("Invalid URL: {pathname}")]
    InvalidPathname { pathname: String },

    #[error("Invalid package name \"{name}\" ({reason})")]
    InvalidPackageName { name: String, reason: String },

    // Registry errors
    #[error("Cannot find package {spec}")]
    PackageNotFound { spec: String },

    #[error("Cannot get config for package {spec}")]
    ConfigMissing { spec: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Tarball errors
    #[error("Tarball error: {message}")]
    Tarball {
        message: String,
        #[source]
        source: std::io::Error,
    },

    // Module rewriting errors
    #[error("{kind}: {message}")]
    ModuleRewrite {
        kind: String,
        message: String,
        code_frame: String,
    },

    // Config errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for pkgcdn operations
pub type CdnResult<T> = Result<T, CdnError>;

impl CdnError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create a tarball error from a std::io::Error
    pub fn tarball(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Tarball {
            message: message.into(),
            source,
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }
}
