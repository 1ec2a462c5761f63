//! Content digests served to clients.
//!
//! `integrity` values are SRI strings (`sha384-<base64>`); ETags follow the
//! `"<length hex>-<base64 sha1 prefix>"` shape common to Node servers.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha1::Sha1;
use sha2::{Digest, Sha384};

/// Incremental SRI digest, fed one tar block at a time
#[derive(Clone, Default)]
pub struct IntegrityHasher {
    hasher: Sha384,
    len: u64,
}

impl IntegrityHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more content
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.len += data.len() as u64;
    }

    /// Number of bytes hashed so far
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finish and return the `sha384-...` string
    pub fn finish(self) -> String {
        format!("sha384-{}", STANDARD.encode(self.hasher.finalize()))
    }
}

/// Compute the SRI sha384 digest of a complete buffer
pub fn sri_sha384(data: &[u8]) -> String {
    let mut hasher = IntegrityHasher::new();
    hasher.update(data);
    hasher.finish()
}

/// Strong ETag for a response body
pub fn etag(data: &[u8]) -> String {
    let digest = STANDARD.encode(Sha1::digest(data));
    format!("\"{:x}-{}\"", data.len(), &digest[..27])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sri_sha384_known_value() {
        // echo -n "hello world" | openssl dgst -sha384 -binary | base64
        assert_eq!(
            sri_sha384(b"hello world"),
            "sha384-/b2OdaZ/KfcBpOBAOF4uI5hjA+oQI5IRr5B/y7g1eLPkF8txzmRu/QgZ3YwIjeG9"
        );
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = IntegrityHasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        assert_eq!(hasher.len(), 11);
        assert_eq!(hasher.finish(), sri_sha384(b"hello world"));
    }

    #[test]
    fn test_etag_shape() {
        assert_eq!(etag(b""), "\"0-2jmj7l5rSw0yVb/vlWAYkK/YBwk\"");
        assert_eq!(etag(b"hello world"), "\"b-Kq5sNclPz7QV2+lfQIuc6R7oRu0\"");
    }
}
