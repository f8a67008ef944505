use axum::{extract::Path, http::StatusCode, Json};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::AppError;

/// Upper bound for `/api/sleep/:ms`.
pub const MAX_SLEEP_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct Slept {
    pub slept_ms: u64,
    pub at: String,
}

// ─── GET /api/sleep/:ms ──────────────────────────────────────────

pub async fn sleep(Path(ms): Path<u64>) -> Result<Json<Slept>, AppError> {
    if ms > MAX_SLEEP_MS {
        return Err(AppError::BadRequest(format!(
            "ms must be at most {MAX_SLEEP_MS}"
        )));
    }

    tokio::time::sleep(Duration::from_millis(ms)).await;

    Ok(Json(Slept {
        slept_ms: ms,
        at: chrono::Utc::now().to_rfc3339(),
    }))
}

// ─── POST /api/echo ──────────────────────────────────────────────

pub async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(serde_json::json!({
        "echo":        body,
        "received_at": chrono::Utc::now().to_rfc3339(),
    }))
}

// ─── GET /api/status/:code ───────────────────────────────────────

pub async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), AppError> {
    let status = StatusCode::from_u16(code)
        .map_err(|_| AppError::BadRequest(format!("invalid status code {code}")))?;
    Ok((status, Json(serde_json::json!({ "status": code }))))
}

// ─── GET /api/work ───────────────────────────────────────────────

/// Simulated work: mostly 5–30 ms, with a 1 % tail of 200–500 ms.
pub async fn work() -> Json<Slept> {
    // ThreadRng is !Send, so pick the delay before awaiting
    let ms = {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(0.01) {
            rng.gen_range(200..=500u64)
        } else {
            rng.gen_range(5..=30u64)
        }
    };

    tokio::time::sleep(Duration::from_millis(ms)).await;

    Json(Slept {
        slept_ms: ms,
        at: chrono::Utc::now().to_rfc3339(),
    })
}
