//! Latency observatory demo service
//!
//! Serves a handful of synthetic `/api` endpoints behind the Wrap adapter and
//! publishes their request/response counts and latency quantiles at
//! `/debug/vars`.

use anyhow::Context;
use clap::Parser;
use latency_observatory::{server, Config, Registry};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "latency-observatory", version, about)]
struct Args {
    /// Path to a TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address, overrides `server.addr` from the config
    #[arg(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default: INFO, use RUST_LOG=debug for per-request and rotation events
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    // ── 1. Configuration ─────────────────────────────────────────
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {path}"))?,
        None => Config::default(),
    };
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    info!(
        addr = %config.server.addr,
        publish_name = %config.server.publish_name,
        window_count = config.window.window_count,
        rotation_period_secs = config.window.rotation_period_secs,
        min_latency_ms = config.window.min_latency_ms,
        max_latency_ms = config.window.max_latency_ms,
        sigfigs = config.window.sigfigs,
        "config loaded"
    );

    // ── 2. Bind ──────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("binding {}", config.server.addr))?;
    let local = listener.local_addr()?;

    // ── 3. Shared state & router ─────────────────────────────────
    let registry = Arc::new(Registry::with_process_vars());
    let state = Arc::new(server::AppState::new(
        registry,
        format!("http://127.0.0.1:{}", local.port()),
    ));
    let (app, _rotator) = server::create_router(state, &config)?;

    info!("listening on http://{local}");
    info!("vars        → http://{local}/debug/vars");
    info!("vars stream → http://{local}/debug/vars/stream");

    // ── 4. Serve ─────────────────────────────────────────────────
    axum::serve(listener, app)
        .await
        .context("server exited with error")?;

    Ok(())
}
