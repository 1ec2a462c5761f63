//! Permanent redirects for retired URL forms

use axum::http::StatusCode;

use crate::output::Reply;
use crate::query::Query;

/// `/_meta/<path>` becomes `/<path>?meta`, and `?json` becomes `?meta`
pub fn redirect_legacy_urls(path: &str, query: &Query) -> Option<Reply> {
    if let Some(rest) = path.strip_prefix("/_meta/") {
        let mut query = query.clone();
        query.insert("meta", "");
        let location = format!("/{}{}", rest, query.to_search());
        return Some(Reply::redirect(StatusCode::MOVED_PERMANENTLY, &location));
    }

    if query.has("json") {
        let mut query = query.clone();
        query.remove("json");
        query.insert("meta", "");
        let location = format!("{}{}", path, query.to_search());
        return Some(Reply::redirect(StatusCode::MOVED_PERMANENTLY, &location));
    }

    None
}
