//! Stage implementations
//!
//! Every redirect and miss carries the caching headers of the stage that
//! produced it; the edge cache relies on them.

use axum::http::StatusCode;
use serde_json::json;
use tracing::{debug, error};

use pkgcdn_core::error::{CdnError, CdnResult};
use pkgcdn_core::types::PackageSpec;
use pkgcdn_core::utils::validate_package_name;
use pkgcdn_registry::ByteStream;
use pkgcdn_resolver::{select_entry_point, EntryPoint};

use super::pathname::{self, package_url};
use super::{Flow, PackageRequest};
use crate::app::AppContext;
use crate::output::{CacheControl, Reply};

/// 403 for anything that does not look like `/{name}[@version][/file]`
pub fn parse_pathname(request: &mut PackageRequest) -> Flow {
    match pathname::parse_pathname(&request.pathname) {
        Some(spec) => {
            request.spec = Some(spec);
            Flow::Continue
        }
        None => {
            let error = CdnError::InvalidPathname {
                pathname: request.pathname.clone(),
            };
            Flow::Halt(Reply::json(StatusCode::FORBIDDEN, &json!({ "error": error.to_string() })))
        }
    }
}

/// 403 for hash-like names and names npm would refuse
pub fn validate_name(request: &mut PackageRequest) -> CdnResult<Flow> {
    let spec = request.spec()?;
    match validate_package_name(&spec.name) {
        Ok(()) => Ok(Flow::Continue),
        Err(error @ CdnError::InvalidPackageName { .. }) => {
            Ok(Flow::Halt(Reply::text(StatusCode::FORBIDDEN, error.to_string())))
        }
        Err(other) => Err(other),
    }
}

/// 404 for unknown packages and versions, 302 when the request named a tag
/// or range instead of the exact version
pub async fn resolve_version(ctx: &AppContext, request: &mut PackageRequest) -> CdnResult<Flow> {
    let spec = request.spec()?;
    let resolved = ctx.versions.resolve(&spec.name, &spec.requested).await?;

    let Some(version) = resolved else {
        let error = CdnError::PackageNotFound {
            spec: format!("{}@{}", spec.name, spec.requested),
        };
        return Ok(Flow::Halt(Reply::text(StatusCode::NOT_FOUND, error.to_string())));
    };

    request.spec_mut()?.resolved = Some(version);

    let spec = request.spec()?;
    if !spec.is_canonical() {
        let version = spec.version();
        let location = format!(
            "{}{}",
            request.base,
            package_url(&spec.name, Some(version), &spec.filename, &request.query)
        );
        debug!(package = %spec.name, requested = %spec.requested, %version, "semver redirect");
        return Ok(Flow::Halt(
            Reply::redirect(StatusCode::FOUND, &location)
                .cache(CacheControl::SemverRedirect, &["redirect", "semver-redirect"]),
        ));
    }

    Ok(Flow::Continue)
}

/// 500 when the registry lists a version it has no manifest for
pub async fn load_config(ctx: &AppContext, request: &mut PackageRequest) -> CdnResult<Flow> {
    let spec = request.spec()?;
    match ctx.registry().get_package_config(&spec.name, spec.version()).await? {
        Some(config) => {
            request.config = Some(config);
            Ok(Flow::Continue)
        }
        None => {
            let error = CdnError::ConfigMissing { spec: spec.spec() };
            error!("{}", error);
            Ok(Flow::Halt(Reply::text(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())))
        }
    }
}

/// Redirect requests without a filename to the package's entry file
pub fn resolve_filename(request: &mut PackageRequest) -> CdnResult<Flow> {
    let spec = request.spec()?;
    if !spec.filename.is_empty() {
        return Ok(Flow::Continue);
    }

    let module = request.query.has("module");
    match select_entry_point(request.config()?, module) {
        EntryPoint::File(filename) => {
            let location = package_url(&spec.name, Some(spec.version()), &filename, &request.query);
            Ok(Flow::Halt(
                Reply::redirect(StatusCode::FOUND, &location)
                    .cache(CacheControl::OneYear, &["redirect", "filename-redirect"]),
            ))
        }
        EntryPoint::MissingModule => Ok(Flow::Halt(Reply::text(
            StatusCode::NOT_FOUND,
            format!("Package {} does not contain an ES module", spec.spec()),
        ))),
    }
}

/// The tarball of a resolved package, or the 404 to send when the registry
/// has lost it
pub async fn open_tarball(ctx: &AppContext, spec: &PackageSpec) -> CdnResult<Result<ByteStream, Reply>> {
    match ctx.registry().get_tarball_stream(&spec.name, spec.version()).await? {
        Some(stream) => Ok(Ok(stream)),
        None => {
            let error = CdnError::PackageNotFound { spec: spec.spec() };
            Ok(Err(Reply::text(StatusCode::NOT_FOUND, error.to_string())))
        }
    }
}

/// Find the requested file in the tarball. Extension-less and directory
/// requests are redirected to the file they resolve to.
pub async fn resolve_entry(ctx: &AppContext, request: &mut PackageRequest) -> CdnResult<Flow> {
    let spec = request.spec()?;

    let stream = match open_tarball(ctx, spec).await? {
        Ok(stream) => stream,
        Err(reply) => return Ok(Flow::Halt(reply)),
    };

    let mut result = ctx.entries.search_entries(stream, &spec.filename).await?;

    let Some(found) = result.found.take() else {
        return Ok(Flow::Halt(
            Reply::text(
                StatusCode::NOT_FOUND,
                format!("Cannot find \"{}\" in {}", spec.filename, spec.spec()),
            )
            .cache(CacheControl::OneYear, &["missing", "missing-entry"]),
        ));
    };

    if found.is_directory() {
        let reply = match result.index_entry(&spec.filename) {
            Some(index) => {
                let location = package_url(&spec.name, Some(spec.version()), &index.path, &request.query);
                Reply::redirect(StatusCode::FOUND, &location)
                    .cache(CacheControl::OneYear, &["redirect", "index-redirect"])
            }
            None => Reply::text(
                StatusCode::NOT_FOUND,
                format!("Cannot find an index in \"{}\" in {}", spec.filename, spec.spec()),
            )
            .cache(CacheControl::OneYear, &["missing", "missing-index"]),
        };
        return Ok(Flow::Halt(reply));
    }

    if found.path != spec.filename {
        let location = package_url(&spec.name, Some(spec.version()), &found.path, &request.query);
        return Ok(Flow::Halt(
            Reply::redirect(StatusCode::FOUND, &location).cache(CacheControl::OneYear, &["redirect", "file-redirect"]),
        ));
    }

    request.entry = Some(found);
    Ok(Flow::Continue)
}
