// =============================================================================
// TickerLens Main Entry Point
// =============================================================================
//
// Serves per-ticker technical metrics over HTTP. Startup is linear: load the
// environment and config, build the bar source, bind the listener, serve
// until Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod assembler;
mod error;
mod indicators;
mod market_data;
mod pipeline;
mod service_config;
mod source;
mod span;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::ApiState;
use crate::service_config::ServiceConfig;
use crate::source::BarSource;

const CONFIG_PATH: &str = "service_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("TickerLens starting up");

    let mut config = ServiceConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ServiceConfig::default()
    });
    config.apply_overrides(|key| std::env::var(key).ok());

    info!(
        upstream_url = %config.upstream_url,
        data_dir = %config.data_dir.display(),
        default_span = %config.default_span,
        fetch_timeout_secs = config.fetch_timeout_secs,
        "configuration resolved"
    );

    // ── 2. Bar source ────────────────────────────────────────────────────
    let source = BarSource::from_config(&config).context("failed to build bar source")?;
    info!(source = %source.kind(), "bar source ready");

    // ── 3. API server ────────────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(ApiState { config, source });
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("TickerLens shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        return;
    }
    warn!("Shutdown signal received, stopping gracefully");
}
