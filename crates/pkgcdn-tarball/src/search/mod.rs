//! Single-pass searches over a tarball
//!
//! Every search reads the archive exactly once, front to back. Directory
//! entries are synthesized from file paths because many published tarballs
//! omit directory headers.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use tar::Archive;

use crate::members::{Capture, TarMembers};
use crate::stream::maybe_gunzip;
use crate::TarballResult;
use pkgcdn_core::error::CdnError;
use pkgcdn_core::types::{EntryMetadata, EntryType, TarEntry};
use pkgcdn_core::utils::{dirname, join};

/// Outcome of a module-resolution search
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Best match for the requested path; the only entry carrying content
    pub found: Option<TarEntry>,
    /// Every entry under the requested prefix, keyed by path
    pub entries: BTreeMap<String, TarEntry>,
}

impl SearchResult {
    /// `<dir>/index.js`, else `<dir>/index.json`, if either is a file
    pub fn index_entry(&self, dir: &str) -> Option<&TarEntry> {
        ["index.js", "index.json"]
            .iter()
            .filter_map(|name| self.entries.get(&join(dir, name)))
            .find(|entry| entry.is_file())
    }
}

/// Gunzip if needed and open as a tar archive
fn open_archive<R>(reader: R) -> TarballResult<Archive<Box<dyn Read + Send>>>
where
    R: Read + Send + 'static,
{
    let reader = maybe_gunzip(reader).map_err(|e| CdnError::tarball("Failed to read tarball", e))?;
    Ok(Archive::new(reader))
}

/// Add a directory entry for each ancestor of `path` accepted by `within`
fn synthesize_ancestors(entries: &mut BTreeMap<String, TarEntry>, path: &str, within: impl Fn(&str) -> bool) {
    let mut dir = dirname(path);
    while dir != "/" {
        if within(dir) && !entries.contains_key(dir) {
            entries.insert(dir.to_string(), TarEntry::directory(dir));
        }
        dir = dirname(dir);
    }
}

/// `path` is `dir` itself or lies below it
fn is_within(path: &str, dir: &str) -> bool {
    dir == "/" || path == dir || path.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

/// Resolve `filename` the way Node resolves a module path: the exact path
/// wins over `<filename>.js`, which wins over `<filename>.json`. When no file
/// matches, whatever entry sits at `filename` (usually a directory) is found.
pub fn search_entries_sync<R>(reader: R, filename: &str) -> TarballResult<SearchResult>
where
    R: Read + Send + 'static,
{
    let js = format!("{}.js", filename);
    let json = format!("{}.json", filename);
    let is_candidate = |path: &str| path == filename || path == js || path == json;

    let mut entries = BTreeMap::new();
    let mut found: Option<TarEntry> = None;

    if filename == "/" {
        let root = TarEntry::directory("/");
        entries.insert(root.path.clone(), root.clone());
        found = Some(root);
    }

    let mut archive = open_archive(reader)?;
    let members = TarMembers::new(&mut archive, |path| {
        if is_candidate(path) {
            Capture::Content
        } else if path.starts_with(filename) {
            Capture::Metadata
        } else {
            Capture::PathOnly
        }
    })?;

    for member in members {
        let mut member = member?;
        if !member.path.starts_with(filename) {
            continue;
        }

        if member.is_directory() {
            entries.entry(member.path.clone()).or_insert(member);
            continue;
        }

        synthesize_ancestors(&mut entries, &member.path, |_| true);

        let content = member.content.take();
        if is_candidate(&member.path) {
            let replace = match &found {
                None => true,
                Some(current) => {
                    current.path != filename
                        && (member.path == filename || (member.path == js && current.path == json))
                }
            };
            if replace {
                // The previous candidate's buffer is released here
                found = Some(TarEntry {
                    content,
                    ..member.clone()
                });
            }
        }
        entries.insert(member.path.clone(), member);
    }

    let found = found.or_else(|| entries.get(filename).cloned());
    Ok(SearchResult { found, entries })
}

/// Immediate children of `dir`, sorted by path. Files carry metadata.
pub fn list_directory_sync<R>(reader: R, dir: &str) -> TarballResult<Vec<TarEntry>>
where
    R: Read + Send + 'static,
{
    let in_dir = |path: &str| path != dir && dirname(path) == dir;

    let mut entries = BTreeMap::new();
    let mut archive = open_archive(reader)?;
    let members = TarMembers::new(&mut archive, |path| {
        if in_dir(path) {
            Capture::Metadata
        } else {
            Capture::PathOnly
        }
    })?;

    for member in members {
        let member = member?;
        synthesize_ancestors(&mut entries, &member.path, in_dir);
        if in_dir(&member.path) {
            entries.insert(member.path.clone(), member);
        }
    }

    Ok(entries.into_values().collect())
}

/// `dir` and everything below it, with metadata. `dir` is always present.
pub fn collect_subtree_sync<R>(reader: R, dir: &str) -> TarballResult<BTreeMap<String, TarEntry>>
where
    R: Read + Send + 'static,
{
    let mut entries = BTreeMap::new();
    entries.insert(dir.to_string(), TarEntry::directory(dir));

    let mut archive = open_archive(reader)?;
    let members = TarMembers::new(&mut archive, |path| {
        if is_within(path, dir) {
            Capture::Metadata
        } else {
            Capture::PathOnly
        }
    })?;

    for member in members {
        let member = member?;
        synthesize_ancestors(&mut entries, &member.path, |ancestor| is_within(ancestor, dir));
        if !is_within(&member.path, dir) {
            continue;
        }
        if member.is_directory() {
            entries.entry(member.path.clone()).or_insert(member);
        } else {
            entries.insert(member.path.clone(), member);
        }
    }

    Ok(entries)
}

/// The last file member at exactly `filename`
pub fn find_entry_sync<R>(reader: R, filename: &str, with_content: bool) -> TarballResult<Option<TarEntry>>
where
    R: Read + Send + 'static,
{
    let wanted = if with_content { Capture::Content } else { Capture::Metadata };

    let mut archive = open_archive(reader)?;
    let members = TarMembers::new(&mut archive, |path| {
        if path == filename {
            wanted
        } else {
            Capture::PathOnly
        }
    })?;

    let mut found = None;
    for member in members {
        let member = member?;
        if member.is_file() && member.path == filename {
            found = Some(member);
        }
    }
    Ok(found)
}

/// Recursive metadata document for `dir`. Directories list their children
/// in path order; file fields are omitted on directories.
pub fn subtree_metadata(dir: &str, entries: &BTreeMap<String, TarEntry>) -> EntryMetadata {
    let mut children: HashMap<&str, Vec<&TarEntry>> = HashMap::new();
    for (path, entry) in entries {
        if path != "/" {
            children.entry(dirname(path)).or_default().push(entry);
        }
    }
    directory_metadata(dir, &children)
}

fn directory_metadata(path: &str, children: &HashMap<&str, Vec<&TarEntry>>) -> EntryMetadata {
    let files = children
        .get(path)
        .map(|kids| {
            kids.iter()
                .map(|kid| {
                    if kid.is_file() {
                        kid.metadata()
                    } else {
                        directory_metadata(&kid.path, children)
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    EntryMetadata {
        path: path.to_string(),
        entry_type: EntryType::Directory,
        content_type: None,
        integrity: None,
        last_modified: None,
        size: None,
        files: Some(files),
    }
}
