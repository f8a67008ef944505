use serde::{Deserialize, Serialize};

use super::histogram::BucketedHistogram;

/// Percentiles reported in every snapshot, in field order.
pub const QUANTILES: [f64; 6] = [50.0, 75.0, 90.0, 95.0, 99.0, 99.9];

/// Point-in-time report for one instrumented handler.
/// Serialized with the published field names (`Requests`, `P50`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    pub requests: u64,
    pub responses: u64,
    /// Latency quantiles over the trailing window, in milliseconds
    pub p50: u64,
    pub p75: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub p999: u64,
}

impl Snapshot {
    /// Reads the fixed quantile list out of a merged window histogram.
    /// An empty histogram reports zero for every quantile.
    pub fn from_histogram(requests: u64, responses: u64, hist: &BucketedHistogram) -> Self {
        let [p50, p75, p90, p95, p99, p999] = QUANTILES.map(|q| hist.value_at_quantile(q));
        Self {
            requests,
            responses,
            p50,
            p75,
            p90,
            p95,
            p99,
            p999,
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            requests: 0,
            responses: 0,
            p50: 0,
            p75: 0,
            p90: 0,
            p95: 0,
            p99: 0,
            p999: 0,
        }
    }

    /// Requests received but not yet answered.
    pub fn in_flight(&self) -> u64 {
        self.requests.saturating_sub(self.responses)
    }
}
