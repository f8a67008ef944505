pub mod wrap;

pub use wrap::{publish_stats, wrap, wrap_fn, wrap_with_config, Instrumented};
