//! Content-type detection for tarball entries.

use super::path::{basename, extname};

/// Bare file names and extensions that are always served as plain text
const FORCED_TEXT: &[&str] = &[
    "authors", "changes", "license", "makefile", "patents", "readme", "ts", "flow",
];

/// Detect the content type of an entry from its path
pub fn content_type_for(path: &str) -> &'static str {
    let name = basename(path).to_ascii_lowercase();

    if is_text_dotfile(&name) {
        return "text/plain";
    }

    let ext = extname(&name).trim_start_matches('.');
    let key = if ext.is_empty() { name.as_str() } else { ext };

    if FORCED_TEXT.contains(&key) {
        return "text/plain";
    }

    match key {
        "js" | "mjs" | "cjs" => "application/javascript",
        "json" | "map" => "application/json",
        "jsx" => "text/jsx",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "less" => "text/less",
        "scss" => "text/x-scss",
        "coffee" => "text/coffeescript",
        "md" | "markdown" => "text/markdown",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "yml" | "yaml" => "text/yaml",
        "csv" => "text/csv",
        "sh" => "application/x-sh",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "tgz" => "application/gzip",
        _ => "text/plain",
    }
}

/// Names like `.babelrc`, `.gitattributes`, `.npmignore` and `yarn.lock`
fn is_text_dotfile(name: &str) -> bool {
    let Some(index) = name.rfind('.') else {
        return false;
    };
    let suffix = &name[index + 1..];
    if !suffix.bytes().all(|b| b.is_ascii_lowercase()) {
        return false;
    }
    suffix.ends_with("rc") || suffix.starts_with("git") || suffix.ends_with("ignore") || suffix == "lock"
}

/// Value for the `Content-Type` header; JavaScript always declares utf-8
pub fn content_type_header(content_type: &str) -> String {
    if content_type == "application/javascript" {
        format!("{}; charset=utf-8", content_type)
    } else {
        content_type.to_string()
    }
}
