//! Tarball entry types.
//!
//! Entry paths are rooted at `/` with the archive's top-level directory
//! stripped, so `package/lib/index.js` becomes `/lib/index.js`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of tarball entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
}

/// A single file or (possibly synthesized) directory inside a tarball
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    /// Normalized path, always starting with `/`
    pub path: String,
    pub entry_type: EntryType,
    /// Only set for files
    pub content_type: Option<String>,
    /// SRI digest (`sha384-...`), only set for files
    pub integrity: Option<String>,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    /// File body; only retained for the entry a request selected
    pub content: Option<Vec<u8>>,
}

impl TarEntry {
    /// A directory entry with no metadata
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entry_type: EntryType::Directory,
            content_type: None,
            integrity: None,
            size: None,
            last_modified: None,
            content: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Format the modification time the way HTTP `Last-Modified` expects
    pub fn last_modified_http(&self) -> Option<String> {
        self.last_modified.map(http_date)
    }

    /// Metadata document for this entry without children
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            path: self.path.clone(),
            entry_type: self.entry_type,
            content_type: self.content_type.clone(),
            integrity: self.integrity.clone(),
            last_modified: self.last_modified_http(),
            size: self.size,
            files: None,
        }
    }
}

/// JSON document served for `?meta` requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Children, only present for directories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<EntryMetadata>>,
}

/// RFC 7231 IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
