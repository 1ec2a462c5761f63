//! Path helpers for tarball entry paths and request filenames.
//!
//! These operate on `/`-separated strings, never on the host file system.

/// Replace a tar member's top-level directory (`package/`, or whatever a
/// publisher used) with a single leading `/`.
pub fn normalize_entry_path(raw: &str) -> String {
    let trimmed = raw.trim_start_matches("./");
    match trimmed.find('/') {
        Some(index) => format!("/{}", &trimmed[index + 1..]),
        None => "/".to_string(),
    }
}

/// Collapse runs of `/` into one
pub fn collapse_slashes(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                result.push(c);
            }
            previous_slash = true;
        } else {
            result.push(c);
            previous_slash = false;
        }
    }
    result
}

/// Parent directory of a rooted path; the root is its own parent
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/",
        Some(index) => &trimmed[..index],
    }
}

/// Last path segment
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

/// Extension including the dot; empty for dotfiles and extension-less names
pub fn extname(path: &str) -> &str {
    let base = basename(path);
    match base.rfind('.') {
        Some(0) | None => "",
        Some(index) => &base[index..],
    }
}

/// Join a rooted directory and a relative name
pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    format!("{}/{}", dir, name)
}
