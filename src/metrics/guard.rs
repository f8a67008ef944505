use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use super::histogram::BucketedHistogram;
use super::windowed::WindowedHistogram;
use crate::config::WindowConfig;
use crate::error::HistogramError;

/// Single coarse lock around a [`WindowedHistogram`].
///
/// Record, rotate and snapshot are mutually exclusive. Record holds the lock
/// for one bucket increment, rotate for one slot clear, snapshot for one
/// merge of the whole ring.
pub struct GuardedHistogram {
    inner: Mutex<WindowedHistogram>,
}

impl GuardedHistogram {
    pub fn new(window: WindowedHistogram) -> Self {
        Self {
            inner: Mutex::new(window),
        }
    }

    pub fn from_config(config: &WindowConfig) -> Result<Self, HistogramError> {
        let window = WindowedHistogram::new(
            config.window_count,
            config.min_latency_ms,
            config.max_latency_ms,
            config.sigfigs,
        )?;
        Ok(Self::new(window))
    }

    /// Records a latency, truncated to whole milliseconds.
    pub fn record(&self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.record_ms(ms);
    }

    pub fn record_ms(&self, ms: u64) {
        self.inner.lock().record_current(ms);
    }

    pub fn rotate(&self) {
        let rotations = {
            let mut window = self.inner.lock();
            window.rotate();
            window.rotations()
        };
        debug!(rotations, "latency window rotated");
    }

    /// Merged view of the whole trailing window.
    pub fn snapshot(&self) -> BucketedHistogram {
        self.inner.lock().snapshot()
    }

    /// Runs `f` with the lock held.
    pub fn with_lock<R>(&self, f: impl FnOnce(&WindowedHistogram) -> R) -> R {
        let window = self.inner.lock();
        f(&*window)
    }

    pub fn rotations(&self) -> u64 {
        self.inner.lock().rotations()
    }
}
