pub mod guard;
pub mod histogram;
pub mod percentiles;
pub mod rotation;
pub mod stats;
pub mod stream;
pub mod windowed;

pub use guard::GuardedHistogram;
pub use histogram::BucketedHistogram;
pub use percentiles::{Snapshot, QUANTILES};
pub use rotation::Rotator;
pub use stats::{HandlerStats, InFlight};
pub use windowed::WindowedHistogram;
