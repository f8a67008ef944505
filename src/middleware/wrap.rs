use axum::{
    extract::{Request, State},
    middleware::{self as axum_mw, Next},
    response::Response,
    Router,
};
use std::sync::Arc;
use tracing::debug;

use crate::config::WindowConfig;
use crate::error::{PublishError, WrapError};
use crate::metrics::{GuardedHistogram, HandlerStats, Rotator};
use crate::publish::Registry;

/// An instrumented router and the pieces that keep its stats alive.
pub struct Instrumented {
    pub router: Router,
    pub stats: Arc<HandlerStats>,
    /// Dropping this detaches the rotation task rather than stopping it.
    pub rotator: Rotator,
}

/// Wraps `router` with the stock window (5 × 1 minute, 1ms..3min, 3 sigfigs)
/// and publishes its stats in `registry` under `name`.
///
/// State-carrying routers should call `with_state` first. Must be called
/// from within a tokio runtime.
pub fn wrap(router: Router, registry: &Registry, name: &str) -> Result<Instrumented, WrapError> {
    wrap_with_config(router, registry, name, &WindowConfig::default())
}

/// [`wrap`] with an explicit window configuration.
pub fn wrap_with_config(
    router: Router,
    registry: &Registry,
    name: &str,
    config: &WindowConfig,
) -> Result<Instrumented, WrapError> {
    config.validate()?;
    let histogram = Arc::new(GuardedHistogram::from_config(config)?);
    let stats = Arc::new(HandlerStats::new(histogram.clone()));

    // Publish first so a name clash leaves no orphaned rotation task behind.
    publish_stats(registry, name, stats.clone())?;
    let rotator = Rotator::spawn(histogram, config.rotation_period());

    let router = router.layer(axum_mw::from_fn_with_state(stats.clone(), instrument));
    Ok(Instrumented {
        router,
        stats,
        rotator,
    })
}

/// Publishes `stats.snapshot()` as a JSON variable.
pub fn publish_stats(
    registry: &Registry,
    name: &str,
    stats: Arc<HandlerStats>,
) -> Result<(), PublishError> {
    registry.publish(name, move || {
        serde_json::to_value(stats.snapshot()).unwrap_or(serde_json::Value::Null)
    })
}

/// Synchronous counterpart of [`wrap`] for any `Fn(Req) -> Resp`.
///
/// The returned function counts the request, delegates, and on return or
/// panic records the latency and counts the response. Panics propagate
/// unchanged.
pub fn wrap_fn<Req, Resp, F>(stats: Arc<HandlerStats>, f: F) -> impl Fn(Req) -> Resp + Send + Sync
where
    F: Fn(Req) -> Resp + Send + Sync,
{
    move |req| {
        let _inflight = stats.track();
        f(req)
    }
}

/// Middleware body: count, delegate, then record latency and count the
/// response. Also adds two response headers:
///
///   X-Response-Time-Us  - total handler wall time in microseconds
///   Server-Timing       - same value in the standard Server-Timing format
async fn instrument(
    State(stats): State<Arc<HandlerStats>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let inflight = stats.track();
    let start = inflight.started_at();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    drop(inflight);

    let us = elapsed.as_micros();
    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }
    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    let status = response.status().as_u16();
    debug!(%method, %path, status, us = us as u64, "request served");

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::thread;
    use std::time::Duration;

    fn stats() -> Arc<HandlerStats> {
        let h = GuardedHistogram::from_config(&WindowConfig::default()).unwrap();
        Arc::new(HandlerStats::new(Arc::new(h)))
    }

    #[test]
    fn test_wrap_fn_counts_and_times() {
        let s = stats();
        let handler = wrap_fn(s.clone(), |ms: u64| {
            thread::sleep(Duration::from_millis(ms));
            ms * 2
        });

        for _ in 0..20 {
            assert_eq!(handler(10), 20);
        }

        let snap = s.snapshot();
        assert_eq!(snap.requests, 20);
        assert_eq!(snap.responses, 20);
        assert!((10..=20).contains(&snap.p50), "p50 = {}", snap.p50);
    }

    #[test]
    fn test_wrap_fn_propagates_panic_after_recording() {
        let s = stats();
        let handler = wrap_fn(s.clone(), |fail: bool| {
            if fail {
                panic!("boom");
            }
            "ok"
        });

        assert_eq!(handler(false), "ok");
        let err = panic::catch_unwind(AssertUnwindSafe(|| handler(true))).unwrap_err();
        assert_eq!(err.downcast_ref::<&str>(), Some(&"boom"));

        let snap = s.snapshot();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.responses, 2);
        assert_eq!(s.histogram().snapshot().len(), 2);
    }

    #[test]
    fn test_wrap_fn_result_errors_pass_through() {
        let s = stats();
        let handler = wrap_fn(s.clone(), |n: i32| -> Result<i32, String> {
            if n < 0 {
                Err(format!("negative: {n}"))
            } else {
                Ok(n)
            }
        });
        assert_eq!(handler(-1), Err("negative: -1".to_string()));
        assert_eq!(handler(3), Ok(3));
        assert_eq!(s.snapshot().responses, 2);
    }

    #[tokio::test]
    async fn test_wrap_rejects_duplicate_name() {
        let registry = Registry::new();
        let first = wrap(Router::new(), &registry, "http").unwrap();
        let second = wrap(Router::new(), &registry, "http");
        assert!(matches!(
            second,
            Err(WrapError::Publish(PublishError::Duplicate(_)))
        ));
        first.rotator.shutdown().await;
    }

    #[tokio::test]
    async fn test_wrap_rejects_invalid_config() {
        let registry = Registry::new();
        let config = WindowConfig {
            window_count: 0,
            ..WindowConfig::default()
        };
        let result = wrap_with_config(Router::new(), &registry, "http", &config);
        assert!(matches!(result, Err(WrapError::Config(_))));
        assert!(registry.get("http").is_none());
    }

    #[tokio::test]
    async fn test_published_snapshot_before_traffic() {
        let registry = Registry::new();
        let wrapped = wrap(Router::new(), &registry, "http").unwrap();
        assert_eq!(
            registry.get("http").unwrap(),
            serde_json::json!({
                "Requests": 0, "Responses": 0,
                "P50": 0, "P75": 0, "P90": 0, "P95": 0, "P99": 0, "P999": 0,
            })
        );
        wrapped.rotator.shutdown().await;
    }
}
