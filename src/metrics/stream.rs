use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::publish::Registry;

/// Routes exposing a [`Registry`]:
///
///   GET /debug/vars         - every variable as one JSON object
///   GET /debug/vars/stream  - the same object pushed over SSE every 500 ms
///   GET /debug/vars/:name   - a single variable, 404 if unknown
pub fn routes(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/debug/vars", get(get_vars))
        .route("/debug/vars/stream", get(vars_stream))
        .route("/debug/vars/:name", get(get_var))
        .with_state(registry)
}

// ─── GET /debug/vars ─────────────────────────────────────────────

pub async fn get_vars(State(registry): State<Arc<Registry>>) -> Json<Value> {
    Json(registry.render())
}

// ─── GET /debug/vars/:name ───────────────────────────────────────

pub async fn get_var(
    State(registry): State<Arc<Registry>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    registry.get(&name).map(Json).ok_or_else(|| {
        let body = serde_json::json!({
            "error":  format!("variable '{name}' not published"),
            "status": StatusCode::NOT_FOUND.as_u16(),
        });
        (StatusCode::NOT_FOUND, Json(body))
    })
}

// ─── GET /debug/vars/stream ──────────────────────────────────────
/// Server-Sent Events endpoint; two updates per second.

pub async fn vars_stream(
    State(registry): State<Arc<Registry>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(Duration::from_millis(500));

    let stream = IntervalStream::new(interval).map(move |_| {
        let json = serde_json::to_string(&registry.render()).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
