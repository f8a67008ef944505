use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::guard::GuardedHistogram;

/// Handle to the background task that rotates a latency window on a fixed
/// period.
///
/// Dropping the handle detaches the task; it keeps rotating until the runtime
/// shuts down. Use [`stop`](Self::stop) or [`shutdown`](Self::shutdown) to
/// end it explicitly.
pub struct Rotator {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Rotator {
    /// Spawns the rotation loop. The first rotation happens one `period`
    /// after spawning. Must be called from within a tokio runtime.
    pub fn spawn(histogram: Arc<GuardedHistogram>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(rotate_loop(histogram, period, shutdown_rx));
        info!(period_secs = period.as_secs_f64(), "latency window rotation started");
        Self { shutdown_tx, task }
    }

    /// Signals the task to exit without waiting for it.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Signals the task to exit and waits until it has.
    pub async fn shutdown(self) {
        self.stop();
        // JoinError only means the task already panicked or was aborted
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn rotate_loop(
    histogram: Arc<GuardedHistogram>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut detached = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => histogram.rotate(),
            changed = shutdown_rx.changed(), if !detached => {
                match changed {
                    Ok(()) if *shutdown_rx.borrow() => break,
                    Ok(()) => {}
                    Err(_) => {
                        debug!("rotator handle dropped, rotation continues detached");
                        detached = true;
                    }
                }
            }
        }
    }

    info!(rotations = histogram.rotations(), "latency window rotation stopped");
}
