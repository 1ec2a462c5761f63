//! Browse pages
//!
//! The browse surface resolves what to show; how it looks is up to a
//! `BrowseRenderer`. The bundled renderer answers with the page data as JSON.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pkgcdn_core::types::{EntryMetadata, TarEntry};
use pkgcdn_core::utils::content_type_for;
use serde::Serialize;

use super::{CacheControl, Reply};

/// Everything a browse view needs
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsePage {
    pub package_name: String,
    pub package_version: String,
    /// Ascending semver order
    pub available_versions: Vec<String>,
    pub filename: String,
    pub target: BrowseTarget,
}

/// The directory or file being browsed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BrowseTarget {
    /// Immediate children keyed by path
    Directory {
        path: String,
        details: BTreeMap<String, EntryMetadata>,
    },
    File { path: String, details: FileDetails },
}

impl BrowseTarget {
    pub fn directory(path: impl Into<String>, children: &[TarEntry]) -> Self {
        let details = children
            .iter()
            .map(|entry| (entry.path.clone(), entry.metadata()))
            .collect();
        BrowseTarget::Directory {
            path: path.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub content_type: String,
    pub integrity: Option<String>,
    pub language: String,
    pub size: u64,
    /// `data:` URI for images, which are shown inline
    pub uri: Option<String>,
}

impl FileDetails {
    pub fn from_entry(entry: &TarEntry) -> Self {
        let content_type = entry
            .content_type
            .clone()
            .unwrap_or_else(|| content_type_for(&entry.path).to_string());
        let content = entry.content.as_deref().unwrap_or_default();

        let uri = content_type
            .starts_with("image/")
            .then(|| format!("data:{};base64,{}", content_type, STANDARD.encode(content)));

        Self {
            language: language_name(&entry.path),
            integrity: entry.integrity.clone(),
            size: entry.size.unwrap_or(content.len() as u64),
            content_type,
            uri,
        }
    }
}

/// Renders browse pages into replies
pub trait BrowseRenderer: Send + Sync {
    fn render(&self, page: &BrowsePage) -> Reply;
}

/// Serves the page data itself as JSON
#[derive(Debug, Default)]
pub struct JsonBrowseRenderer;

impl BrowseRenderer for JsonBrowseRenderer {
    fn render(&self, page: &BrowsePage) -> Reply {
        Reply::json(StatusCode::OK, page).cache(CacheControl::FourHours, &["browse"])
    }
}

/// Human-friendly name for the kind of file at `path`
pub fn language_name(path: &str) -> String {
    // text/plain by content type, but more can be said
    if path.ends_with(".flow") {
        return "Flow".to_string();
    }
    if path.ends_with(".d.ts") || path.ends_with(".tsx") {
        return "TypeScript".to_string();
    }
    if path.ends_with(".map") {
        return "Source Map (JSON)".to_string();
    }

    let content_type = content_type_for(path);
    let name = match content_type {
        "application/javascript" => "JavaScript",
        "application/json" => "JSON",
        "application/octet-stream" => "Binary",
        "application/vnd.ms-fontobject" => "Embedded OpenType",
        "application/xml" => "XML",
        "image/svg+xml" => "SVG",
        "font/ttf" => "TrueType Font",
        "font/woff" => "WOFF",
        "font/woff2" => "WOFF2",
        "text/css" => "CSS",
        "text/html" => "HTML",
        "text/jsx" => "JSX",
        "text/markdown" => "Markdown",
        "text/plain" => "Plain Text",
        "text/x-scss" => "SCSS",
        "text/yaml" => "YAML",
        other => other,
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgcdn_core::types::EntryType;
    use serde_json::json;

    fn file(path: &str, content: &[u8]) -> TarEntry {
        TarEntry {
            path: path.to_string(),
            entry_type: EntryType::File,
            content_type: Some(content_type_for(path).to_string()),
            integrity: Some("sha384-test".to_string()),
            size: Some(content.len() as u64),
            last_modified: None,
            content: Some(content.to_vec()),
        }
    }

    #[test]
    fn test_language_names() {
        assert_eq!(language_name("/index.js"), "JavaScript");
        assert_eq!(language_name("/types/index.d.ts"), "TypeScript");
        assert_eq!(language_name("/App.tsx"), "TypeScript");
        assert_eq!(language_name("/lib/x.js.flow"), "Flow");
        assert_eq!(language_name("/dist/x.js.map"), "Source Map (JSON)");
        assert_eq!(language_name("/README.md"), "Markdown");
        assert_eq!(language_name("/LICENSE"), "Plain Text");
        assert_eq!(language_name("/logo.png"), "image/png");
    }

    #[test]
    fn test_image_details_carry_data_uri() {
        let details = FileDetails::from_entry(&file("/logo.png", b"\x89PNG"));
        assert_eq!(details.uri.as_deref(), Some("data:image/png;base64,iVBORw=="));
        assert_eq!(details.size, 4);

        let details = FileDetails::from_entry(&file("/index.js", b"module.exports = 1"));
        assert!(details.uri.is_none());
        assert_eq!(details.language, "JavaScript");
    }

    #[test]
    fn test_json_renderer() {
        let page = BrowsePage {
            package_name: "left-pad".to_string(),
            package_version: "1.3.0".to_string(),
            available_versions: vec!["1.2.0".to_string(), "1.3.0".to_string()],
            filename: "/".to_string(),
            target: BrowseTarget::directory("/", &[file("/index.js", b"x")]),
        };
        let reply = JsonBrowseRenderer.render(&page);

        assert_eq!(reply.header_value("cache-control"), Some("public, max-age=14400"));
        assert_eq!(reply.header_value("cache-tag"), Some("browse"));

        let body: serde_json::Value = serde_json::from_slice(reply.body()).unwrap();
        assert_eq!(body["packageName"], "left-pad");
        assert_eq!(body["availableVersions"], json!(["1.2.0", "1.3.0"]));
        assert_eq!(body["target"]["type"], "directory");
        assert_eq!(body["target"]["details"]["/index.js"]["contentType"], "application/javascript");
    }
}
