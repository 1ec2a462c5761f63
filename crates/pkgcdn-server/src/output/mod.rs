//! HTTP responses and their caching headers.
//!
//! Handlers and pipeline stages build `Reply` values; only the router turns
//! them into axum responses.

pub mod browse;
pub mod errors;

use axum::body::Body;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use tracing::error;

/// Characters that cannot appear verbatim in a `Location` header
const LOCATION: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Custom header read by the edge cache for bulk invalidation
pub const CACHE_TAG: &str = "cache-tag";

/// `Cache-Control` lifetimes used by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheControl {
    /// Files, canonicalizing redirects and permanent misses
    OneYear,
    /// Version redirects: 10 minutes at the edge, 1 minute in browsers
    SemverRedirect,
    /// Browse pages
    FourHours,
}

impl CacheControl {
    pub fn header_value(self) -> &'static str {
        match self {
            CacheControl::OneYear => "public, max-age=31536000",
            CacheControl::SemverRedirect => "public, s-maxage=600, max-age=60",
            CacheControl::FourHours => "public, max-age=14400",
        }
    }
}

/// A complete HTTP response
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    headers: Vec<(HeaderName, String)>,
    body: Vec<u8>,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Plain text body
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status, body.into()).header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
    }

    /// JSON body; a value that cannot be serialized becomes a 500
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status, body).header(header::CONTENT_TYPE, "application/json; charset=utf-8"),
            Err(e) => {
                error!("Failed to serialize response body: {}", e);
                Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    /// Redirect to `location`, escaping characters headers cannot carry
    pub fn redirect(status: StatusCode, location: &str) -> Self {
        let location = utf8_percent_encode(location, LOCATION).to_string();
        let reason = status.canonical_reason().unwrap_or("Redirecting");
        Self::text(status, format!("{}. Redirecting to {}", reason, location)).header(header::LOCATION, location)
    }

    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.retain(|(existing, _)| *existing != name);
        self.headers.push((name, value.into()));
        self
    }

    /// Set `Cache-Control` and the comma separated `Cache-Tag`
    pub fn cache(self, control: CacheControl, tags: &[&str]) -> Self {
        let reply = self.header(header::CACHE_CONTROL, control.header_value());
        if tags.is_empty() {
            reply
        } else {
            reply.header(HeaderName::from_static(CACHE_TAG), tags.join(", "))
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[cfg(test)]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.as_str().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[cfg(test)]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        match builder.body(Body::from(self.body)) {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to build response: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_headers() {
        let reply = Reply::text(StatusCode::FOUND, "").cache(CacheControl::SemverRedirect, &["redirect", "semver-redirect"]);
        assert_eq!(reply.header_value("Cache-Control"), Some("public, s-maxage=600, max-age=60"));
        assert_eq!(reply.header_value("Cache-Tag"), Some("redirect, semver-redirect"));
    }

    #[test]
    fn test_redirect_escapes_location() {
        let reply = Reply::redirect(StatusCode::FOUND, "/pkg@1.0.0/with space/ü.js?module");
        assert_eq!(reply.status(), StatusCode::FOUND);
        assert_eq!(reply.header_value("location"), Some("/pkg@1.0.0/with%20space/%C3%BC.js?module"));
        assert_eq!(
            String::from_utf8_lossy(reply.body()),
            "Found. Redirecting to /pkg@1.0.0/with%20space/%C3%BC.js?module"
        );
    }

    #[test]
    fn test_header_replaces_existing() {
        let reply = Reply::text(StatusCode::OK, "x").header(header::CONTENT_TYPE, "application/javascript; charset=utf-8");
        assert_eq!(reply.header_value("content-type"), Some("application/javascript; charset=utf-8"));
        assert_eq!(reply.headers.len(), 1);
    }

    #[test]
    fn test_into_response() {
        let response = Reply::text(StatusCode::NOT_FOUND, "missing")
            .cache(CacheControl::OneYear, &["missing", "missing-entry"])
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["cache-tag"], "missing, missing-entry");
    }
}
