//! Request handlers and routing.
//!
//! Everything except the health probe goes through `route`, which picks a
//! surface from the path and query the same way for every request:
//!
//! 1. legacy `/_meta/...` and `?json` URLs are permanently redirected
//! 2. `/browse/...` renders directory listings and file details
//! 3. `?meta` answers with entry metadata
//! 4. `?module` serves rewritten ES modules
//! 5. other paths ending in `/` move to `/browse`
//! 6. anything else is a file

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use pkgcdn_core::error::CdnResult;

use crate::app::{AppContext, AppState};
use crate::output::errors::ErrorFormatter;
use crate::output::Reply;
use crate::query::Query;

pub mod browse;
pub mod file;
pub mod legacy;
pub mod meta;
pub mod module;

#[cfg(test)]
pub(crate) mod test_support;

const BROWSE_PREFIX: &str = "/browse";

/// Startup and liveness probe
pub async fn health() -> &'static str {
    "ok"
}

/// Entry point for every package URL
pub async fn serve(State(state): State<AppState>, uri: Uri) -> Response {
    match route(&state, &uri).await {
        Ok(reply) => reply.into_response(),
        Err(error) => ErrorFormatter::new().internal_error(&uri.to_string(), &error).into_response(),
    }
}

/// Dispatch a request to the surface that handles it
pub async fn route(ctx: &AppContext, uri: &Uri) -> CdnResult<Reply> {
    let path = uri.path();
    let query = Query::parse(uri.query());

    if let Some(reply) = legacy::redirect_legacy_urls(path, &query) {
        return Ok(reply);
    }

    if let Some(rest) = browse_path(path) {
        return browse::serve(ctx, rest, query).await;
    }

    if query.has("meta") {
        return meta::serve(ctx, path, query).await;
    }

    if query.has("module") {
        return module::serve(ctx, path, query).await;
    }

    if path.ends_with('/') {
        let location = match uri.query() {
            Some(raw) => format!("{}{}?{}", BROWSE_PREFIX, path, raw),
            None => format!("{}{}", BROWSE_PREFIX, path),
        };
        return Ok(Reply::redirect(StatusCode::FOUND, &location));
    }

    file::serve(ctx, path, query).await
}

/// The path below `/browse`, if the request is for the browse surface
fn browse_path(path: &str) -> Option<&str> {
    match path.strip_prefix(BROWSE_PREFIX)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Redirect away any query key outside `allowed`
fn allow_query(base: &str, path: &str, query: &Query, allowed: &[&str]) -> Option<Reply> {
    if query.only(allowed) {
        return None;
    }
    let location = format!("{}{}{}", base, path, query.retain(allowed).to_search());
    debug!(%location, "stripping query");
    Some(Reply::redirect(StatusCode::FOUND, &location))
}

/// Directory a trailing-slash filename names: `/dist/` is `/dist`, `/` stays `/`
fn directory_path(filename: &str) -> &str {
    let dir = filename.strip_suffix('/').unwrap_or(filename);
    if dir.is_empty() {
        "/"
    } else {
        dir
    }
}
