//! Raw file responses

use axum::http::{header, StatusCode};

use pkgcdn_core::error::CdnResult;
use pkgcdn_core::types::TarEntry;
use pkgcdn_core::utils::{content_type_for, content_type_header, etag, extname};

use crate::app::AppContext;
use crate::output::{CacheControl, Reply};
use crate::pipeline::{PackageRequest, Pipeline};
use crate::query::Query;

/// Serve a file exactly as it appears in the tarball
pub async fn serve(ctx: &AppContext, path: &str, query: Query) -> CdnResult<Reply> {
    // File URLs take no query at all
    if !query.is_empty() {
        return Ok(Reply::redirect(StatusCode::FOUND, path));
    }

    let mut request = PackageRequest::new("", path, query);
    if let Some(reply) = Pipeline::entries().run(ctx, &mut request).await? {
        return Ok(reply);
    }

    Ok(file_reply(request.take_entry()?))
}

/// 200 with the entry's bytes, tagged `file, <ext>-file`
pub fn file_reply(entry: TarEntry) -> Reply {
    let ext = extname(&entry.path).trim_start_matches('.');
    let mut tags = vec!["file".to_string()];
    if !ext.is_empty() {
        tags.push(format!("{}-file", ext));
    }
    let tags: Vec<&str> = tags.iter().map(String::as_str).collect();

    let content_type = entry
        .content_type
        .clone()
        .unwrap_or_else(|| content_type_for(&entry.path).to_string());
    let last_modified = entry.last_modified_http();
    let content = entry.content.unwrap_or_default();
    let length = content.len().to_string();
    let tag = etag(&content);

    let reply = Reply::new(StatusCode::OK, content)
        .header(header::CONTENT_TYPE, content_type_header(&content_type))
        .header(header::CONTENT_LENGTH, length)
        .header(header::ETAG, tag)
        .cache(CacheControl::OneYear, &tags);

    match last_modified {
        Some(last_modified) => reply.header(header::LAST_MODIFIED, last_modified),
        None => reply,
    }
}
