//! Streaming tarball search for pkgcdn
//!
//! Package tarballs are never written to disk. The upstream byte stream is
//! bridged into a blocking reader, gunzipped when it is gzip-framed, and
//! walked once as a tar archive. Only the entry a request selects keeps its
//! file body; every other entry is reduced to its metadata as it passes.

pub mod members;
pub mod resolver;
pub mod search;
pub mod stream;

// Re-export main types
pub use members::{Capture, TarMembers};
pub use resolver::EntryResolver;
pub use search::{subtree_metadata, SearchResult};
pub use stream::{maybe_gunzip, ChannelReader};

use pkgcdn_core::error::CdnError;

/// Result type for tarball operations
pub type TarballResult<T> = Result<T, CdnError>;
