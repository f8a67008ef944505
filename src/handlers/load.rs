use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::load_generator::LoadReport;
use crate::server::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    /// Number of concurrent Tokio tasks generating load
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// How long the run lasts (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,
}

fn default_concurrency() -> u32 {
    10
}
fn default_duration() -> u64 {
    30
}

#[derive(Debug, Serialize)]
pub struct LoadStatus {
    pub running: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<LoadReport>,
}

// ─── POST /api/load/start ────────────────────────────────────────

pub async fn start_load(
    State(state): State<Arc<AppState>>,
    Json(config): Json<LoadConfig>,
) -> Result<Json<LoadStatus>, AppError> {
    // Guard: only one run at a time
    if state.load_running.load(Ordering::SeqCst) {
        return Err(AppError::AlreadyRunning);
    }

    if config.concurrency == 0 || config.concurrency > 500 {
        return Err(AppError::BadRequest(
            "concurrency must be between 1 and 500".into(),
        ));
    }
    if config.duration_secs == 0 || config.duration_secs > 300 {
        return Err(AppError::BadRequest(
            "duration_secs must be between 1 and 300".into(),
        ));
    }

    // Flip the flag BEFORE spawning so workers see it immediately
    state.load_running.store(true, Ordering::SeqCst);

    let msg = format!(
        "Started: {} workers × {}s",
        config.concurrency, config.duration_secs,
    );

    let handle = tokio::spawn(crate::load_generator::run(
        state.load_running.clone(),
        state.http.clone(),
        state.base_url.clone(),
        config.concurrency,
        config.duration_secs,
    ));

    // Stash the handle so `stop` can await clean shutdown
    *state.load_handle.lock().await = Some(handle);

    Ok(Json(LoadStatus {
        running: true,
        message: msg,
        report: None,
    }))
}

// ─── POST /api/load/stop ─────────────────────────────────────────

pub async fn stop_load(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    // Signal all workers to stop
    state.load_running.store(false, Ordering::SeqCst);

    // Await the generator task so we know it's fully stopped
    let handle = state.load_handle.lock().await.take();
    let report = match handle {
        Some(handle) => handle.await.ok(),
        None => None,
    };

    Json(LoadStatus {
        running: false,
        message: if report.is_some() {
            "Load generator stopped".into()
        } else {
            "No load generator was running".into()
        },
        report,
    })
}

// ─── GET /api/load/status ────────────────────────────────────────

pub async fn load_status(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    let running = state.load_running.load(Ordering::SeqCst);
    Json(LoadStatus {
        running,
        message: if running {
            "Load generator in progress".into()
        } else {
            "Idle".into()
        },
        report: None,
    })
}
