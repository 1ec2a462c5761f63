//! The `/browse` surface

use axum::http::StatusCode;

use pkgcdn_core::error::CdnResult;

use super::{directory_path, BROWSE_PREFIX};
use crate::app::AppContext;
use crate::output::browse::{BrowsePage, BrowseTarget, FileDetails};
use crate::output::Reply;
use crate::pipeline::stages::open_tarball;
use crate::pipeline::{PackageRequest, Pipeline};
use crate::query::Query;

/// Directory listing for paths ending in `/`, file details otherwise.
/// `path` is relative to `/browse`.
pub async fn serve(ctx: &AppContext, path: &str, query: Query) -> CdnResult<Reply> {
    if !query.is_empty() {
        return Ok(Reply::redirect(StatusCode::FOUND, &format!("{}{}", BROWSE_PREFIX, path)));
    }

    let mut request = PackageRequest::new(BROWSE_PREFIX, path, query);
    if let Some(reply) = Pipeline::browse().run(ctx, &mut request).await? {
        return Ok(reply);
    }

    let spec = request.spec()?;
    let stream = match open_tarball(ctx, spec).await? {
        Ok(stream) => stream,
        Err(reply) => return Ok(reply),
    };
    let not_found = || Reply::text(StatusCode::NOT_FOUND, format!("Not found: {}", spec));

    let target = if spec.filename.ends_with('/') {
        let dir = directory_path(&spec.filename);
        let children = ctx.entries.list_directory(stream, dir).await?;
        if children.is_empty() {
            return Ok(not_found());
        }
        BrowseTarget::directory(dir, &children)
    } else {
        match ctx.entries.find_entry(stream, &spec.filename, true).await? {
            Some(entry) => BrowseTarget::File {
                path: spec.filename.clone(),
                details: FileDetails::from_entry(&entry),
            },
            None => return Ok(not_found()),
        }
    };

    let page = BrowsePage {
        package_name: spec.name.clone(),
        package_version: spec.version().to_string(),
        available_versions: ctx.versions.available_versions(&spec.name).await?,
        filename: spec.filename.clone(),
        target,
    };

    Ok(ctx.browse.render(&page))
}
