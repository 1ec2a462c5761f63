//! Shared request context and the HTTP router

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use pkgcdn_config::ServerConfig;
use pkgcdn_core::error::CdnResult;
use pkgcdn_registry::{PackageRegistry, RegistryClient};
use pkgcdn_resolver::VersionResolver;
use pkgcdn_rewrite::ModuleRewriter;
use pkgcdn_tarball::EntryResolver;

use crate::handlers;
use crate::output::browse::{BrowseRenderer, JsonBrowseRenderer};

/// Everything a request handler needs, built once at startup
pub struct AppContext {
    pub versions: VersionResolver,
    pub entries: EntryResolver,
    pub rewriter: ModuleRewriter,
    pub browse: Box<dyn BrowseRenderer>,
}

/// Router state
pub type AppState = Arc<AppContext>;

impl AppContext {
    pub fn from_config(config: &ServerConfig) -> CdnResult<Self> {
        let client = RegistryClient::new(&config.registry)?;
        let registry = PackageRegistry::new(client, &config.cache);

        Ok(Self {
            versions: VersionResolver::new(registry),
            entries: EntryResolver::default(),
            rewriter: ModuleRewriter::new(config.origin.clone()),
            browse: Box::new(JsonBrowseRenderer),
        })
    }

    pub fn registry(&self) -> &PackageRegistry {
        self.versions.registry()
    }

    /// Drop expired resolution cache entries, returning how many went
    pub fn sweep_cache(&self) -> usize {
        let cache = self.registry().cache();
        let removed = cache.cleanup();
        let stats = cache.stats();
        debug!(
            removed,
            entries = stats.total_entries,
            bytes = stats.total_bytes,
            hits = stats.hits,
            misses = stats.misses,
            "swept resolution cache"
        );
        removed
    }
}

/// Sweep the resolution cache every `period` until the runtime shuts down
pub fn spawn_cache_sweeper(state: AppState, period: Duration) -> tokio::task::JoinHandle<()> {
    let period = period.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            state.sweep_cache();
        }
    })
}

/// All routes plus CORS, request tracing and panic recovery
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/_health", get(handlers::health))
        .route("/*path", get(handlers::serve))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
