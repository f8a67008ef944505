//! Configuration for the latency window and the demo service.
//!
//! Every field has a serde default, so an empty TOML file (or none at all)
//! yields the stock five-minute window tracking 1ms..3min at 3 sigfigs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Name the instrumented router is published under by default.
pub const DEFAULT_PUBLISH_NAME: &str = "http";

/// `{windowCount, rotationPeriod, minLatencyMs, maxLatencyMs, sigfigs}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Retired time slots kept in the ring
    #[serde(default = "default_window_count")]
    pub window_count: usize,

    /// Seconds between rotations
    #[serde(default = "default_rotation_period_secs")]
    pub rotation_period_secs: u64,

    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,

    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,

    /// Significant decimal digits kept per value bucket (1–5)
    #[serde(default = "default_sigfigs")]
    pub sigfigs: u8,
}

fn default_window_count() -> usize {
    5
}
fn default_rotation_period_secs() -> u64 {
    60
}
fn default_min_latency_ms() -> u64 {
    1
}
fn default_max_latency_ms() -> u64 {
    180_000
}
fn default_sigfigs() -> u8 {
    3
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_count: default_window_count(),
            rotation_period_secs: default_rotation_period_secs(),
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
            sigfigs: default_sigfigs(),
        }
    }
}

impl WindowConfig {
    pub fn rotation_period(&self) -> Duration {
        Duration::from_secs(self.rotation_period_secs)
    }

    /// Trailing duration covered by quantile reports.
    pub fn trailing_window(&self) -> Duration {
        self.rotation_period() * self.window_count as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_count == 0 {
            return Err(ConfigError::Invalid("window_count must be at least 1".into()));
        }
        if self.rotation_period_secs == 0 {
            return Err(ConfigError::Invalid(
                "rotation_period_secs must be at least 1".into(),
            ));
        }
        if self.min_latency_ms == 0 {
            return Err(ConfigError::Invalid("min_latency_ms must be at least 1".into()));
        }
        if self.max_latency_ms < self.min_latency_ms.saturating_mul(2) {
            return Err(ConfigError::Invalid(format!(
                "max_latency_ms ({}) must be at least twice min_latency_ms ({})",
                self.max_latency_ms, self.min_latency_ms
            )));
        }
        if !(1..=5).contains(&self.sigfigs) {
            return Err(ConfigError::Invalid(format!(
                "sigfigs must be between 1 and 5, got {}",
                self.sigfigs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,

    /// Registry name for the `/api` router's stats
    #[serde(default = "default_publish_name")]
    pub publish_name: String,
}

fn default_addr() -> String {
    "0.0.0.0:3000".into()
}
fn default_publish_name() -> String {
    DEFAULT_PUBLISH_NAME.into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            publish_name: default_publish_name(),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub window: WindowConfig,
}

impl Config {
    /// Loads and validates a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: "<inline>".into(),
            source,
        })?;
        config.window.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_stock_window() {
        let c = WindowConfig::default();
        assert_eq!(c.window_count, 5);
        assert_eq!(c.rotation_period(), Duration::from_secs(60));
        assert_eq!(c.min_latency_ms, 1);
        assert_eq!(c.max_latency_ms, 180_000);
        assert_eq!(c.sigfigs, 3);
        assert_eq!(c.trailing_window(), Duration::from_secs(300));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let c = Config::from_toml("").unwrap();
        assert_eq!(c, Config::default());
        assert_eq!(c.server.publish_name, "http");
    }

    #[test]
    fn test_partial_window_section() {
        let c = Config::from_toml(
            r#"
[server]
addr = "127.0.0.1:8080"

[window]
window_count = 10
rotation_period_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(c.server.addr, "127.0.0.1:8080");
        assert_eq!(c.window.window_count, 10);
        assert_eq!(c.window.rotation_period_secs, 30);
        assert_eq!(c.window.max_latency_ms, 180_000);
    }

    #[test]
    fn test_validation_errors() {
        let bad = [
            WindowConfig { window_count: 0, ..Default::default() },
            WindowConfig { rotation_period_secs: 0, ..Default::default() },
            WindowConfig { min_latency_ms: 0, ..Default::default() },
            WindowConfig { min_latency_ms: 100, max_latency_ms: 150, ..Default::default() },
            WindowConfig { sigfigs: 0, ..Default::default() },
            WindowConfig { sigfigs: 6, ..Default::default() },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))), "{c:?}");
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[window]\nsigfigs = 2\n").unwrap();
        file.flush().unwrap();

        let c = Config::from_file(file.path()).unwrap();
        assert_eq!(c.window.sigfigs, 2);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[window]\nsigfigs = \"three\"\n").unwrap();
        file.flush().unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => {
                assert_eq!(path, file.path().display().to_string())
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(matches!(
            Config::from_file("/definitely/not/here.toml"),
            Err(ConfigError::Read { .. })
        ));
    }
}
