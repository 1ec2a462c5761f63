//! # pkgcdn
//!
//! Edge gateway that serves files straight out of npm package tarballs.
//!
//! This is the entry point of the `pkgcdn` binary. It parses flags, sets up
//! logging and panic reporting, layers the configuration and runs the HTTP
//! server until Ctrl+C.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod handlers;
mod output;
mod pipeline;
mod query;

use app::AppContext;
use pkgcdn_config::{ConfigLayering, ConfigLoader};

/// Serve npm package files over HTTP
#[derive(Parser)]
#[command(name = "pkgcdn", version, about = "Serve npm package files over HTTP")]
pub struct Cli {
    /// Configuration file (defaults to pkgcdn.toml found upwards from the cwd)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Public origin used in rewritten module URLs
    #[arg(long)]
    pub origin: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "PKGCDN_LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    /// Flags that override the file and environment layers
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(port) = self.port {
            overrides.insert("port".to_string(), port.to_string());
        }
        if let Some(origin) = &self.origin {
            overrides.insert("origin".to_string(), origin.clone());
        }
        overrides
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.log_json);
    setup_panic_handler();

    info!("Starting pkgcdn v{}", env!("CARGO_PKG_VERSION"));

    let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
    rt.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|path| anyhow::anyhow!("Working directory is not valid UTF-8: {}", path.display()))?;

    let (file_config, source) = ConfigLoader::new(cwd).load_file_config(cli.config.as_deref()).await?;
    info!(?source, "Loaded configuration");

    let config = ConfigLayering::merge_configs(file_config, ConfigLayering::collect_env_overrides(), cli.overrides())?;

    let state = Arc::new(AppContext::from_config(&config)?);
    let sweeper = app::spawn_cache_sweeper(state.clone(), config.cache.ttl());
    let app = app::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on port {}, Ctrl+C to quit", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    sweeper.abort();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

fn setup_logging(verbose: bool, json: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pkgcdn={},tower_http={}", level, level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("pkgcdn encountered an unexpected error: {}", panic_info);
    }));
}
