//! The request pipeline
//!
//! A package request passes through an ordered list of stages. Each stage
//! either refines the request and lets the next one run, or halts with the
//! reply the client gets (a redirect, a 403, a 404 ...). Errors are reserved
//! for failures nobody expected.
//!
//! ```text
//! ParsePathname -> ValidateName -> ResolveVersion -> LoadConfig
//!     -> ResolveFilename -> ResolveEntry
//! ```

pub mod pathname;
pub mod stages;

use pkgcdn_core::error::{CdnError, CdnResult};
use pkgcdn_core::types::{PackageConfig, PackageSpec, TarEntry};
use tracing::debug;

use crate::app::AppContext;
use crate::output::Reply;
use crate::query::Query;

/// One step of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    ParsePathname,
    ValidateName,
    ResolveVersion,
    LoadConfig,
    ResolveFilename,
    ResolveEntry,
}

/// Outcome of a single stage
#[derive(Debug)]
pub enum Flow {
    Continue,
    Halt(Reply),
}

impl Stage {
    pub async fn run(self, ctx: &AppContext, request: &mut PackageRequest) -> CdnResult<Flow> {
        match self {
            Stage::ParsePathname => Ok(stages::parse_pathname(request)),
            Stage::ValidateName => stages::validate_name(request),
            Stage::ResolveVersion => stages::resolve_version(ctx, request).await,
            Stage::LoadConfig => stages::load_config(ctx, request).await,
            Stage::ResolveFilename => stages::resolve_filename(request),
            Stage::ResolveEntry => stages::resolve_entry(ctx, request).await,
        }
    }
}

/// An ordered list of stages
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Stages must be listed in execution order
    pub fn new(stages: Vec<Stage>) -> Self {
        debug_assert!(stages.windows(2).all(|pair| pair[0] < pair[1]), "stages out of order");
        Self { stages }
    }

    /// Everything up to a located entry: files and modules
    pub fn entries() -> Self {
        Self::new(vec![
            Stage::ParsePathname,
            Stage::ValidateName,
            Stage::ResolveVersion,
            Stage::LoadConfig,
            Stage::ResolveFilename,
            Stage::ResolveEntry,
        ])
    }

    /// Metadata reads the tarball itself
    pub fn metadata() -> Self {
        Self::new(vec![
            Stage::ParsePathname,
            Stage::ValidateName,
            Stage::ResolveVersion,
            Stage::LoadConfig,
            Stage::ResolveFilename,
        ])
    }

    /// Browsing needs no concrete filename
    pub fn browse() -> Self {
        Self::new(vec![
            Stage::ParsePathname,
            Stage::ValidateName,
            Stage::ResolveVersion,
            Stage::LoadConfig,
        ])
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every stage in order. `Some(reply)` if one of them halted.
    pub async fn run(&self, ctx: &AppContext, request: &mut PackageRequest) -> CdnResult<Option<Reply>> {
        for stage in &self.stages {
            match stage.run(ctx, request).await? {
                Flow::Continue => {}
                Flow::Halt(reply) => {
                    debug!(?stage, status = %reply.status(), pathname = %request.pathname, "pipeline halted");
                    return Ok(Some(reply));
                }
            }
        }
        Ok(None)
    }
}

/// A request as it moves through the pipeline
#[derive(Debug, Clone)]
pub struct PackageRequest {
    /// Mount point the pathname was found under: `""` or `/browse`
    pub base: &'static str,
    /// Path below `base`, still percent-encoded
    pub pathname: String,
    pub query: Query,
    /// Set by `ParsePathname`; resolved by `ResolveVersion`
    pub spec: Option<PackageSpec>,
    /// Set by `LoadConfig`
    pub config: Option<PackageConfig>,
    /// Set by `ResolveEntry`; the only entry carrying content
    pub entry: Option<TarEntry>,
}

impl PackageRequest {
    pub fn new(base: &'static str, pathname: impl Into<String>, query: Query) -> Self {
        Self {
            base,
            pathname: pathname.into(),
            query,
            spec: None,
            config: None,
            entry: None,
        }
    }

    pub fn spec(&self) -> CdnResult<&PackageSpec> {
        self.spec.as_ref().ok_or_else(|| CdnError::InvalidPathname {
            pathname: self.pathname.clone(),
        })
    }

    fn spec_mut(&mut self) -> CdnResult<&mut PackageSpec> {
        let pathname = &self.pathname;
        self.spec.as_mut().ok_or_else(|| CdnError::InvalidPathname {
            pathname: pathname.clone(),
        })
    }

    pub fn config(&self) -> CdnResult<&PackageConfig> {
        let spec = self.spec()?;
        self.config.as_ref().ok_or_else(|| CdnError::ConfigMissing { spec: spec.spec() })
    }

    /// Take the located entry out of the request
    pub fn take_entry(&mut self) -> CdnResult<TarEntry> {
        let spec = self.spec()?.to_string();
        self.entry.take().ok_or(CdnError::PackageNotFound { spec })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_share_a_prefix() {
        let entries = Pipeline::entries();
        let metadata = Pipeline::metadata();
        let browse = Pipeline::browse();

        assert_eq!(entries.stages().len(), 6);
        assert!(entries.stages().starts_with(metadata.stages()));
        assert!(metadata.stages().starts_with(browse.stages()));
        assert_eq!(browse.stages().last(), Some(&Stage::LoadConfig));
    }

    #[test]
    #[should_panic(expected = "stages out of order")]
    fn test_out_of_order_stages() {
        Pipeline::new(vec![Stage::ResolveVersion, Stage::ValidateName]);
    }

    #[test]
    fn test_missing_state_is_an_error() {
        let mut request = PackageRequest::new("", "/react", Query::default());
        assert!(matches!(request.spec(), Err(CdnError::InvalidPathname { .. })));

        request.spec = Some(PackageSpec::new("react", "16.8.0", "/index.js"));
        assert!(matches!(request.config(), Err(CdnError::ConfigMissing { .. })));
        assert!(matches!(request.take_entry(), Err(CdnError::PackageNotFound { .. })));
    }
}
