//! Async entry points for tarball searches
//!
//! Each call consumes one upstream tarball stream. The archive is walked on
//! the blocking pool while a pump task feeds it; if the calling future is
//! dropped (the client went away) the pump is aborted and the upstream
//! response released.

use std::collections::BTreeMap;
use std::io;

use tracing::debug;

use crate::search::{self, SearchResult};
use crate::stream::{ChannelReader, DEFAULT_CHANNEL_CAPACITY};
use crate::TarballResult;
use pkgcdn_core::error::CdnError;
use pkgcdn_core::types::{EntryMetadata, TarEntry};
use pkgcdn_registry::ByteStream;

/// Streams tarballs and locates entries in them
#[derive(Debug, Clone)]
pub struct EntryResolver {
    channel_capacity: usize,
}

impl Default for EntryResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl EntryResolver {
    /// `channel_capacity` bounds how many upstream chunks may be in flight
    pub fn new(channel_capacity: usize) -> Self {
        Self { channel_capacity }
    }

    /// Node-style resolution of `filename` (exact, `.js`, `.json`, directory)
    pub async fn search_entries(&self, stream: ByteStream, filename: &str) -> TarballResult<SearchResult> {
        let filename = filename.to_string();
        self.read_blocking(stream, move |reader| search::search_entries_sync(reader, &filename))
            .await
    }

    /// Immediate children of `dir` for browsing
    pub async fn list_directory(&self, stream: ByteStream, dir: &str) -> TarballResult<Vec<TarEntry>> {
        let dir = dir.to_string();
        self.read_blocking(stream, move |reader| search::list_directory_sync(reader, &dir))
            .await
    }

    /// Recursive metadata for `dir` and everything below it
    pub async fn directory_metadata(&self, stream: ByteStream, dir: &str) -> TarballResult<EntryMetadata> {
        let dir = dir.to_string();
        self.read_blocking(stream, move |reader| {
            let entries: BTreeMap<String, TarEntry> = search::collect_subtree_sync(reader, &dir)?;
            Ok(search::subtree_metadata(&dir, &entries))
        })
        .await
    }

    /// The file at exactly `filename`; its body is kept when `with_content`
    pub async fn find_entry(&self, stream: ByteStream, filename: &str, with_content: bool) -> TarballResult<Option<TarEntry>> {
        let filename = filename.to_string();
        self.read_blocking(stream, move |reader| search::find_entry_sync(reader, &filename, with_content))
            .await
    }

    async fn read_blocking<T, W>(&self, stream: ByteStream, work: W) -> TarballResult<T>
    where
        T: Send + 'static,
        W: FnOnce(ChannelReader) -> TarballResult<T> + Send + 'static,
    {
        let (reader, _pump) = ChannelReader::spawn(stream, self.channel_capacity);

        let result = tokio::task::spawn_blocking(move || work(reader))
            .await
            .map_err(|e| {
                CdnError::tarball(
                    "Tarball search was interrupted",
                    io::Error::new(io::ErrorKind::Other, e.to_string()),
                )
            })?;

        if let Err(ref e) = result {
            debug!(error = %e, "tarball search failed");
        }
        result
    }
}
