use hdrhistogram::Histogram;

use crate::error::HistogramError;

/// Fixed-range, fixed-precision latency histogram.
///
/// Thin layer over an HdrHistogram that pins down the policies the window
/// relies on: out-of-range samples are clamped into `[min, max]`, quantiles
/// of an empty histogram are `0`, and only identically laid-out histograms
/// may be merged.
#[derive(Debug, Clone)]
pub struct BucketedHistogram {
    inner: Histogram<u64>,
    min: u64,
    max: u64,
    sigfigs: u8,
}

impl BucketedHistogram {
    /// Creates an empty histogram tracking `[min, max]` with `sigfigs`
    /// significant decimal digits of precision.
    pub fn new(min: u64, max: u64, sigfigs: u8) -> Result<Self, HistogramError> {
        let inner = Histogram::<u64>::new_with_bounds(min, max, sigfigs).map_err(|source| {
            HistogramError::Creation {
                min,
                max,
                sigfigs,
                source,
            }
        })?;

        Ok(Self {
            inner,
            min,
            max,
            sigfigs,
        })
    }

    /// Empty histogram with the same layout as `self`.
    pub fn empty_like(&self) -> Self {
        Self {
            inner: Histogram::new_from(&self.inner),
            min: self.min,
            max: self.max,
            sigfigs: self.sigfigs,
        }
    }

    /// Records one observation, clamping it into `[min, max]` first.
    pub fn record(&mut self, value: u64) {
        let value = value.clamp(self.min, self.max);
        self.inner.saturating_record(value);
    }

    /// Smallest value such that at least `q` percent of the recorded samples
    /// are less than or equal to it, accurate to the bucket width at that
    /// magnitude. `q` is clamped into `[0, 100]`; an empty histogram yields `0`.
    pub fn value_at_quantile(&self, q: f64) -> u64 {
        if self.inner.len() == 0 {
            return 0;
        }
        let q = if q.is_nan() { 100.0 } else { q.clamp(0.0, 100.0) };
        self.inner.value_at_percentile(q).min(self.max)
    }

    /// Adds every bucket of `other` into `self`.
    ///
    /// # Panics
    ///
    /// Panics if the two histograms do not share `(min, max, sigfigs)`; that
    /// only happens when a window was built from mismatched slots.
    pub fn merge(&mut self, other: &BucketedHistogram) {
        if let Err(e) = self.try_merge(other) {
            panic!("{e}");
        }
    }

    /// Fallible form of [`merge`](Self::merge).
    pub fn try_merge(&mut self, other: &BucketedHistogram) -> Result<(), HistogramError> {
        if !self.is_compatible(other) {
            return Err(HistogramError::Incompatible {
                left_min: self.min,
                left_max: self.max,
                left_sigfigs: self.sigfigs,
                right_min: other.min,
                right_max: other.max,
                right_sigfigs: other.sigfigs,
            });
        }
        // Identical layouts with clamped contents always fit.
        self.inner
            .add(&other.inner)
            .expect("compatible histograms must add");
        Ok(())
    }

    pub fn is_compatible(&self, other: &BucketedHistogram) -> bool {
        self.min == other.min && self.max == other.max && self.sigfigs == other.sigfigs
    }

    /// Drops every recorded sample, keeping the layout.
    pub fn clear(&mut self) {
        self.inner.reset();
    }

    /// Total number of recorded samples.
    pub fn len(&self) -> u64 {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    pub fn min_value(&self) -> u64 {
        self.min
    }

    pub fn max_value(&self) -> u64 {
        self.max
    }

    pub fn sigfigs(&self) -> u8 {
        self.sigfigs
    }

    /// Width of the value bucket that `value` falls into.
    pub fn bucket_width(&self, value: u64) -> u64 {
        self.inner.equivalent_range(value.clamp(self.min, self.max))
    }
}
