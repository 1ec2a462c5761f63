//! Error reporting for failed requests.
//!
//! Expected outcomes never get here. Whatever does is logged with its full
//! source chain and answered with a generic 500.

use std::error::Error;

use axum::http::StatusCode;
use pkgcdn_core::error::CdnError;
use tracing::error;

use super::Reply;

/// Formats errors with their `caused by` chain for the log
#[derive(Debug, Default)]
pub struct ErrorFormatter;

impl ErrorFormatter {
    pub fn new() -> Self {
        Self
    }

    /// One line per error in the chain, outermost first
    pub fn format_error(&self, error: &CdnError) -> String {
        let mut output = error.to_string();

        let mut source = error.source();
        while let Some(err) = source {
            output.push_str("\ncaused by: ");
            output.push_str(&err.to_string());
            source = err.source();
        }

        output
    }

    /// Log `error` against the request it broke and build the 500 reply
    pub fn internal_error(&self, target: &str, error: &CdnError) -> Reply {
        error!(url = target, "Request failed: {}", self.format_error(error));
        Reply::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_format_error_walks_chain() {
        let err = CdnError::tarball("Failed to read tarball", io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"));
        let formatted = ErrorFormatter::new().format_error(&err);
        assert_eq!(formatted, "Tarball error: Failed to read tarball\ncaused by: truncated");
    }

    #[test]
    fn test_internal_error_is_generic() {
        let err = CdnError::Network {
            message: "connection reset".to_string(),
            source: None,
        };
        let reply = ErrorFormatter::new().internal_error("/left-pad@1.3.0/index.js", &err);
        assert_eq!(reply.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply.body(), b"Internal Server Error");
    }
}
