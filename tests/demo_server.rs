//! Integration tests for the demo service router.

use latency_observatory::{server, Config, Registry, Snapshot};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

struct Running {
    base: String,
    registry: Arc<Registry>,
}

async fn start(config: Config) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");

    let registry = Arc::new(Registry::with_process_vars());
    let state = Arc::new(server::AppState::new(registry.clone(), base.clone()));
    let (app, rotator) = server::create_router(state, &config).unwrap();
    // keep rotating for the life of the test runtime
    drop(rotator);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Running { base, registry }
}

fn http_snapshot(registry: &Registry, name: &str) -> Snapshot {
    serde_json::from_value(registry.get(name).unwrap()).unwrap()
}

#[tokio::test]
async fn test_api_routes_are_instrumented() {
    let app = start(Config::default()).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/api/sleep/5", app.base)).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["slept_ms"], 5);

    let resp = client
        .post(format!("{}/api/echo", app.base))
        .json(&serde_json::json!({"hello": "world"}))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["echo"]["hello"], "world");

    let resp = client.get(format!("{}/api/status/418", app.base)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 418);

    let resp = client.get(format!("{}/api/sleep/999999", app.base)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let snap = http_snapshot(&app.registry, "http");
    assert_eq!(snap.requests, 4);
    assert_eq!(snap.responses, 4);
    assert!(snap.p999 >= 5);
}

#[tokio::test]
async fn test_debug_vars_are_not_instrumented() {
    let app = start(Config::default()).await;

    let vars: Value = reqwest::get(format!("{}/debug/vars", app.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(vars["cmdline"].is_array());
    assert_eq!(vars["http"]["Requests"], 0);

    let one: Value = reqwest::get(format!("{}/debug/vars/http", app.base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(one["Requests"], 0);
    assert_eq!(one["P999"], 0);

    let missing = reqwest::get(format!("{}/debug/vars/nope", app.base)).await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    assert_eq!(http_snapshot(&app.registry, "http"), Snapshot::empty());
}

#[tokio::test]
async fn test_custom_publish_name() {
    let mut config = Config::default();
    config.server.publish_name = "api".into();
    let app = start(config).await;

    reqwest::get(format!("{}/api/work", app.base)).await.unwrap();

    assert!(app.registry.get("http").is_none());
    assert_eq!(http_snapshot(&app.registry, "api").responses, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_generator_drives_traffic() {
    let app = start(Config::default()).await;
    let client = reqwest::Client::new();

    let bad = client
        .post(format!("{}/api/load/start", app.base))
        .json(&serde_json::json!({"concurrency": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);

    let started: Value = client
        .post(format!("{}/api/load/start", app.base))
        .json(&serde_json::json!({"concurrency": 4, "duration_secs": 1}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(started["running"], true);

    let again = client
        .post(format!("{}/api/load/start", app.base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);

    tokio::time::sleep(Duration::from_millis(300)).await;

    let stopped: Value = client
        .post(format!("{}/api/load/stop", app.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stopped["running"], false);
    let sent = stopped["report"]["sent"].as_u64().unwrap();
    assert!(sent > 0);

    let status: Value = client
        .get(format!("{}/api/load/status", app.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["running"], false);

    // every generated call went through the instrumented /api router
    let snap = http_snapshot(&app.registry, "http");
    assert!(snap.requests >= sent);
    assert_eq!(snap.in_flight(), 0);
}
