//! Error types shared by the metrics engine, configuration and publication.

use thiserror::Error;

/// Failures building or combining latency histograms.
#[derive(Debug, Error)]
pub enum HistogramError {
    /// hdrhistogram refused the (min, max, sigfigs) tuple.
    #[error("cannot create histogram [{min}, {max}] at {sigfigs} sigfigs: {source}")]
    Creation {
        min: u64,
        max: u64,
        sigfigs: u8,
        #[source]
        source: hdrhistogram::CreationError,
    },

    /// Two histograms with different layouts cannot be summed bucket-wise.
    #[error(
        "incompatible histograms: [{left_min}, {left_max}]@{left_sigfigs} vs \
         [{right_min}, {right_max}]@{right_sigfigs}"
    )]
    Incompatible {
        left_min: u64,
        left_max: u64,
        left_sigfigs: u8,
        right_min: u64,
        right_max: u64,
        right_sigfigs: u8,
    },

    /// A ring needs at least one retired slot.
    #[error("window count must be at least 1")]
    EmptyWindow,
}

/// Invalid values in a loaded configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid window config: {0}")]
    Invalid(String),
}

/// Failures registering a variable with a [`crate::publish::Registry`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("variable {0:?} is already published")]
    Duplicate(String),

    #[error("variable name must not be empty")]
    EmptyName,
}

/// Failures wiring the Wrap adapter together.
#[derive(Debug, Error)]
pub enum WrapError {
    #[error(transparent)]
    Histogram(#[from] HistogramError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}
