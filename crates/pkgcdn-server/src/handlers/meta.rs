//! `?meta` responses

use axum::http::StatusCode;

use pkgcdn_core::error::CdnResult;

use super::{allow_query, directory_path};
use crate::app::AppContext;
use crate::output::{CacheControl, Reply};
use crate::pipeline::stages::open_tarball;
use crate::pipeline::{PackageRequest, Pipeline};
use crate::query::Query;

/// Recursive metadata for `/dir/`, or the metadata of a single file
pub async fn serve(ctx: &AppContext, path: &str, query: Query) -> CdnResult<Reply> {
    if let Some(reply) = allow_query("", path, &query, &["meta"]) {
        return Ok(reply);
    }

    let mut request = PackageRequest::new("", path, query);
    if let Some(reply) = Pipeline::metadata().run(ctx, &mut request).await? {
        return Ok(reply);
    }

    let spec = request.spec()?;
    let stream = match open_tarball(ctx, spec).await? {
        Ok(stream) => stream,
        Err(reply) => return Ok(reply),
    };

    if spec.filename.ends_with('/') {
        let metadata = ctx
            .entries
            .directory_metadata(stream, directory_path(&spec.filename))
            .await?;
        return Ok(Reply::json(StatusCode::OK, &metadata));
    }

    match ctx.entries.find_entry(stream, &spec.filename, false).await? {
        Some(entry) => Ok(Reply::json(StatusCode::OK, &entry.metadata())),
        None => Ok(Reply::text(
            StatusCode::NOT_FOUND,
            format!("Cannot find \"{}\" in {}", spec.filename, spec.spec()),
        )
        .cache(CacheControl::OneYear, &["missing", "missing-entry"])),
    }
}
