//! `?module` responses: files with their import specifiers rewritten

use axum::http::{header, StatusCode};
use tracing::error;

use pkgcdn_core::error::{CdnError, CdnResult};
use pkgcdn_core::utils::{content_type_header, etag};

use super::allow_query;
use crate::app::AppContext;
use crate::output::{CacheControl, Reply};
use crate::pipeline::{PackageRequest, Pipeline};
use crate::query::Query;

/// Which rewrite a content type gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleKind {
    JavaScript,
    Html,
}

impl ModuleKind {
    fn of(content_type: &str) -> Option<Self> {
        match content_type {
            "application/javascript" => Some(ModuleKind::JavaScript),
            "text/html" => Some(ModuleKind::Html),
            _ => None,
        }
    }

    fn tags(self) -> [&'static str; 3] {
        match self {
            ModuleKind::JavaScript => ["file", "js-file", "js-module"],
            ModuleKind::Html => ["file", "html-file", "html-module"],
        }
    }
}

pub async fn serve(ctx: &AppContext, path: &str, query: Query) -> CdnResult<Reply> {
    if let Some(reply) = allow_query("", path, &query, &["module"]) {
        return Ok(reply);
    }

    let mut request = PackageRequest::new("", path, query);
    if let Some(reply) = Pipeline::entries().run(ctx, &mut request).await? {
        return Ok(reply);
    }

    let entry = request.take_entry()?;
    let content_type = entry.content_type.clone().unwrap_or_default();
    let Some(kind) = ModuleKind::of(&content_type) else {
        return Ok(Reply::text(
            StatusCode::FORBIDDEN,
            "module mode is available only for JavaScript and HTML files",
        ));
    };

    let dependencies = request.config()?.merged_dependencies();
    let source = String::from_utf8_lossy(entry.content.as_deref().unwrap_or_default());

    let rewritten = match kind {
        ModuleKind::JavaScript => ctx.rewriter.rewrite_javascript(&source, &dependencies),
        ModuleKind::Html => ctx.rewriter.rewrite_html(&source, &dependencies),
    };

    match rewritten {
        Ok(code) => {
            let length = code.len().to_string();
            let tag = etag(code.as_bytes());
            Ok(Reply::new(StatusCode::OK, code)
                .header(header::CONTENT_TYPE, content_type_header(&content_type))
                .header(header::CONTENT_LENGTH, length)
                .header(header::ETAG, tag)
                .cache(CacheControl::OneYear, &kind.tags()))
        }
        Err(CdnError::ModuleRewrite {
            kind: error_kind,
            message,
            code_frame,
        }) => {
            let spec = request.spec()?;
            error!(module = %spec, "{}: {}", error_kind, message);
            Ok(Reply::text(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Cannot generate module for {}\n\n{}: {}\n\n{}",
                    spec, error_kind, message, code_frame
                ),
            ))
        }
        Err(other) => Err(other),
    }
}
