//! Latency observatory
//!
//! Wraps request handlers so every call is counted on the way in and on the
//! way out, with response latency kept in a rotating five-minute window and
//! reported as p50..p999. Stats are published as named JSON variables.
//!
//! Module structure:
//! - `metrics/`    - histogram engine, rotation task, handler stats, snapshot
//! - `middleware/` - the Wrap adapter (axum middleware and plain functions)
//! - `publish`     - named-variable registry
//! - `config`      - window and service configuration
//! - `handlers/`, `load_generator`, `server` - the demo service

pub mod config;
pub mod error;
pub mod handlers;
pub mod load_generator;
pub mod metrics;
pub mod middleware;
pub mod publish;
pub mod server;

pub use config::{Config, WindowConfig};
pub use error::{ConfigError, HistogramError, PublishError, WrapError};
pub use metrics::{HandlerStats, Snapshot};
pub use middleware::{wrap, wrap_fn, wrap_with_config, Instrumented};
pub use publish::Registry;
