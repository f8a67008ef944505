use axum::{
    routing::{get, post},
    Router,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::error::WrapError;
use crate::handlers;
use crate::load_generator::LoadReport;
use crate::metrics::{stream, Rotator};
use crate::middleware::wrap;
use crate::publish::Registry;

/// Shared application state available to every `/api` handler.
pub struct AppState {
    /// Variables served under `/debug/vars`.
    pub registry: Arc<Registry>,

    /// Client the load generator uses to call back into this service.
    pub http: reqwest::Client,

    /// Where this service can reach itself, e.g. `http://127.0.0.1:3000`.
    pub base_url: String,

    /// Flag checked by every load-generator worker on each iteration.
    pub load_running: Arc<AtomicBool>,

    /// Handle to the spawned load-generator task so we can await clean shutdown.
    pub load_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<LoadReport>>>,
}

impl AppState {
    pub fn new(registry: Arc<Registry>, base_url: impl Into<String>) -> Self {
        Self {
            registry,
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            load_running: Arc::new(AtomicBool::new(false)),
            load_handle: tokio::sync::Mutex::new(None),
        }
    }
}

/// Builds the full Axum `Router`: the instrumented `/api` routes plus the
/// uninstrumented `/debug/vars` endpoints. Returns the rotation handle of the
/// `/api` latency window alongside it.
pub fn create_router(state: Arc<AppState>, config: &Config) -> Result<(Router, Rotator), WrapError> {
    let registry = state.registry.clone();

    let api = Router::new()
        // ── Demo endpoints ──────────────────────────────────────
        .route("/api/sleep/:ms", get(handlers::demo::sleep))
        .route("/api/echo", post(handlers::demo::echo))
        .route("/api/status/:code", get(handlers::demo::status))
        .route("/api/work", get(handlers::demo::work))
        // ── Load generator control ──────────────────────────────
        .route("/api/load/start", post(handlers::load::start_load))
        .route("/api/load/stop", post(handlers::load::stop_load))
        .route("/api/load/status", get(handlers::load::load_status))
        .with_state(state);

    let instrumented = wrap::wrap_with_config(
        api,
        &registry,
        &config.server.publish_name,
        &config.window,
    )?;

    let app = Router::new()
        .merge(instrumented.router)
        .merge(stream::routes(registry))
        .layer(CorsLayer::permissive());

    Ok((app, instrumented.rotator))
}
