use super::histogram::BucketedHistogram;
use crate::error::HistogramError;

/// Trailing-window latency distribution.
///
/// A ring of `window_count + 1` histograms: one "current" slot receives
/// writes, the other `window_count` are retired and only read when merged.
/// Each `rotate()` clears the oldest retired slot and makes it current, so a
/// sample stays visible for exactly `window_count` rotations.
#[derive(Debug, Clone)]
pub struct WindowedHistogram {
    slots: Vec<BucketedHistogram>,
    current: usize,
    rotations: u64,
}

impl WindowedHistogram {
    pub fn new(
        window_count: usize,
        min: u64,
        max: u64,
        sigfigs: u8,
    ) -> Result<Self, HistogramError> {
        if window_count == 0 {
            return Err(HistogramError::EmptyWindow);
        }

        let first = BucketedHistogram::new(min, max, sigfigs)?;
        let mut slots = Vec::with_capacity(window_count + 1);
        for _ in 0..window_count {
            slots.push(first.empty_like());
        }
        slots.push(first);

        Ok(Self {
            slots,
            current: 0,
            rotations: 0,
        })
    }

    /// Records into whichever slot is current.
    pub fn record_current(&mut self, value: u64) {
        self.slots[self.current].record(value);
    }

    /// Retires the current slot and activates the oldest one, cleared.
    pub fn rotate(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
        self.slots[self.current].clear();
        self.rotations += 1;
    }

    /// Merges every slot (current and retired) into a fresh histogram.
    /// Nothing in the ring is modified.
    pub fn snapshot(&self) -> BucketedHistogram {
        let mut merged = self.slots[self.current].empty_like();
        for slot in &self.slots {
            merged.merge(slot);
        }
        merged
    }

    pub fn current(&self) -> &BucketedHistogram {
        &self.slots[self.current]
    }

    /// Number of retired slots.
    pub fn window_count(&self) -> usize {
        self.slots.len() - 1
    }

    /// Rotations performed since construction.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }
}
