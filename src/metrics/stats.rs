use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::guard::GuardedHistogram;
use super::percentiles::Snapshot;

/// Request/response counters plus the latency window for one wrapped handler.
///
/// Counters are lock-free and never touch the histogram lock. They use
/// `Relaxed` ordering: the two totals are independent statistics and are not
/// read transactionally with each other or with the histogram.
pub struct HandlerStats {
    requests: AtomicU64,
    responses: AtomicU64,
    histogram: Arc<GuardedHistogram>,
}

impl HandlerStats {
    pub fn new(histogram: Arc<GuardedHistogram>) -> Self {
        Self {
            requests: AtomicU64::new(0),
            responses: AtomicU64::new(0),
            histogram,
        }
    }

    /// Adds `n` to the requests counter and returns the new total.
    pub fn requests(&self, n: u64) -> u64 {
        self.requests.fetch_add(n, Ordering::Relaxed) + n
    }

    /// Adds `n` to the responses counter and returns the new total.
    pub fn responses(&self, n: u64) -> u64 {
        self.responses.fetch_add(n, Ordering::Relaxed) + n
    }

    pub fn histogram(&self) -> &Arc<GuardedHistogram> {
        &self.histogram
    }

    /// Counts a request now and returns a guard that, when dropped, records
    /// the elapsed latency and counts the response. The drop runs on normal
    /// return, on panic unwinding and when an async caller is cancelled.
    pub fn track(&self) -> InFlight<'_> {
        self.requests(1);
        InFlight {
            stats: self,
            start: Instant::now(),
        }
    }

    /// Merges the window and reads both counters under the histogram lock.
    pub fn snapshot(&self) -> Snapshot {
        self.histogram.with_lock(|window| {
            let merged = window.snapshot();
            Snapshot::from_histogram(
                self.requests.load(Ordering::Relaxed),
                self.responses.load(Ordering::Relaxed),
                &merged,
            )
        })
    }
}

/// One request being served. See [`HandlerStats::track`].
#[must_use = "dropping the guard immediately records a zero-latency response"]
pub struct InFlight<'a> {
    stats: &'a HandlerStats,
    start: Instant,
}

impl InFlight<'_> {
    pub fn started_at(&self) -> Instant {
        self.start
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.stats.histogram.record(self.start.elapsed());
        self.stats.responses(1);
    }
}
