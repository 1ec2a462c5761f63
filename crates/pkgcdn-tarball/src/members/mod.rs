//! Pull-based iteration over tar members
//!
//! `TarMembers` yields one normalized `TarEntry` per file or directory header.
//! A caller-supplied closure decides, per file path, how much work to spend on
//! the body: none, a digest, or a digest plus a retained copy.

use std::io::{self, Read};

use chrono::{DateTime, TimeZone, Utc};
use tar::{Archive, Entries, Entry};

use crate::TarballResult;
use pkgcdn_core::error::CdnError;
use pkgcdn_core::types::{EntryType, TarEntry};
use pkgcdn_core::utils::{content_type_for, normalize_entry_path, IntegrityHasher};

/// Read buffer for hashing file bodies
const CHUNK_SIZE: usize = 8 * 1024;

/// Most a retained body buffer reserves up front; header sizes are untrusted
const MAX_PREALLOCATION: u64 = CHUNK_SIZE as u64 * 8;

/// How much of a file member to capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Path, size and mtime only; the body is skipped unread
    PathOnly,
    /// Also content type and integrity; the body is hashed then dropped
    Metadata,
    /// Metadata plus the body itself
    Content,
}

/// Iterator over the members of an archive
pub struct TarMembers<'a, R: 'a + Read, F> {
    entries: Entries<'a, R>,
    capture: F,
}

impl<'a, R, F> TarMembers<'a, R, F>
where
    R: 'a + Read,
    F: FnMut(&str) -> Capture,
{
    pub fn new(archive: &'a mut Archive<R>, capture: F) -> TarballResult<Self> {
        let entries = archive
            .entries()
            .map_err(|e| CdnError::tarball("Failed to read tarball", e))?;
        Ok(Self { entries, capture })
    }

    fn read_member(&mut self, mut entry: Entry<'a, R>) -> TarballResult<Option<TarEntry>> {
        let kind = entry.header().entry_type();
        let raw_path = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        let path = normalize_entry_path(&raw_path);
        let last_modified = entry.header().mtime().ok().and_then(mtime_to_utc);

        if kind.is_dir() {
            let trimmed = path.trim_end_matches('/');
            let mut directory = TarEntry::directory(if trimmed.is_empty() { "/" } else { trimmed });
            directory.last_modified = last_modified;
            return Ok(Some(directory));
        }

        // Links, devices and fifos never resolve to servable content
        if !kind.is_file() {
            return Ok(None);
        }

        let capture = (self.capture)(&path);
        if capture == Capture::PathOnly {
            return Ok(Some(TarEntry {
                path,
                entry_type: EntryType::File,
                content_type: None,
                integrity: None,
                size: Some(entry.size()),
                last_modified,
                content: None,
            }));
        }

        let keep = capture == Capture::Content;
        let declared = entry.size();
        let mut hasher = IntegrityHasher::new();
        let mut content = if keep {
            Vec::with_capacity(declared.min(MAX_PREALLOCATION) as usize)
        } else {
            Vec::new()
        };
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            let n = entry
                .read(&mut buf)
                .map_err(|e| CdnError::tarball(format!("Failed to read {}", path), e))?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            if keep {
                content.extend_from_slice(&buf[..n]);
            }
        }

        if hasher.len() != declared {
            return Err(CdnError::tarball(
                format!("Truncated member {}", path),
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {} bytes, read {}", declared, hasher.len()),
                ),
            ));
        }

        Ok(Some(TarEntry {
            content_type: Some(content_type_for(&path).to_string()),
            size: Some(hasher.len()),
            integrity: Some(hasher.finish()),
            content: keep.then_some(content),
            path,
            entry_type: EntryType::File,
            last_modified,
        }))
    }
}

impl<'a, R, F> Iterator for TarMembers<'a, R, F>
where
    R: 'a + Read,
    F: FnMut(&str) -> Capture,
{
    type Item = TarballResult<TarEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(CdnError::tarball("Malformed tar header", e))),
            };

            match self.read_member(entry) {
                Ok(Some(member)) => return Some(Ok(member)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn mtime_to_utc(seconds: u64) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(seconds).ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}
