use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

// ─── Public entry point ──────────────────────────────────────────

/// Totals for one load-generator run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LoadReport {
    pub sent: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    failed: AtomicU64,
}

/// Spawns `concurrency` Tokio tasks that call the service at `base_url`
/// until the deadline or until `running` is set to false.
pub async fn run(
    running: Arc<AtomicBool>,
    client: reqwest::Client,
    base_url: String,
    concurrency: u32,
    duration_secs: u64,
) -> LoadReport {
    let deadline = Instant::now() + Duration::from_secs(duration_secs);
    let counters = Arc::new(Counters::default());

    info!(concurrency, duration_secs, %base_url, "load generator started");

    let mut handles = Vec::with_capacity(concurrency as usize);
    for worker_id in 0..concurrency {
        let running = running.clone();
        let client = client.clone();
        let base_url = base_url.clone();
        let counters = counters.clone();

        handles.push(tokio::spawn(async move {
            worker(worker_id, running, client, base_url, counters, deadline).await;
        }));
    }

    // Wait for all workers to finish
    for h in handles {
        let _ = h.await;
    }

    // Mark run as finished
    running.store(false, Ordering::SeqCst);

    let report = LoadReport {
        sent: counters.sent.load(Ordering::Relaxed),
        failed: counters.failed.load(Ordering::Relaxed),
    };
    info!(sent = report.sent, failed = report.failed, "load generator finished");
    report
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(
    id: u32,
    running: Arc<AtomicBool>,
    client: reqwest::Client,
    base_url: String,
    counters: Arc<Counters>,
    deadline: Instant,
) {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        // 80 % simulated work, 20 % fixed sleeps
        let url = if rng.gen_bool(0.8) {
            format!("{base_url}/api/work")
        } else {
            format!("{base_url}/api/sleep/{}", rng.gen_range(1..=50u32))
        };

        counters.sent.fetch_add(1, Ordering::Relaxed);
        let ok = match client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(worker = id, error = %e, "load request failed");
                false
            }
        };
        if !ok {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            // don't spin on a dead server
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
