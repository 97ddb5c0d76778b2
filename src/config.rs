//! Layered configuration: built-in defaults, then an optional
//! `config/order_pulse.toml`, then `ORDER_PULSE_*` environment variables
//! (`ORDER_PULSE_WINDOW__BUCKET_WIDTH_MS=5000`).

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on points per chart series.
pub const MAX_BUCKETS: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub window: WindowConfig,
    pub hub: HubConfig,
    pub metrics: MetricsConfig,
}

/// Trailing-window aggregation settings, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub window_width_ms: i64,
    pub bucket_width_ms: i64,
    pub tick_interval_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_width_ms: 180_000,
            bucket_width_ms: 10_000,
            tick_interval_ms: 1_000,
        }
    }
}

impl WindowConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Per-subscriber queue depth. Events beyond it are dropped for that
    /// subscriber only.
    pub subscriber_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { subscriber_buffer: 256 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

impl PulseConfig {
    /// Load from `config/order_pulse.toml` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/order_pulse").required(false))
            .add_source(
                Environment::with_prefix("ORDER_PULSE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Self = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.window_width_ms <= 0 {
            return Err(ConfigError::Invalid("window.window_width_ms must be positive".into()));
        }
        if self.window.bucket_width_ms <= 0 {
            return Err(ConfigError::Invalid("window.bucket_width_ms must be positive".into()));
        }
        let buckets = (self.window.window_width_ms as u64)
            .div_ceil(self.window.bucket_width_ms as u64)
            .saturating_add(1);
        if buckets > MAX_BUCKETS as u64 {
            return Err(ConfigError::Invalid(format!(
                "window.window_width_ms / window.bucket_width_ms yields {buckets} buckets, at most {MAX_BUCKETS} allowed"
            )));
        }
        if self.window.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("window.tick_interval_ms must be positive".into()));
        }
        if self.hub.subscriber_buffer == 0 {
            return Err(ConfigError::Invalid("hub.subscriber_buffer must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_three_minute_window() {
        let config = PulseConfig::default();
        assert_eq!(config.window.window_width_ms, 180_000);
        assert_eq!(config.window.bucket_width_ms, 10_000);
        assert_eq!(config.window.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.hub.subscriber_buffer, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = PulseConfig::from_toml_str(
            r#"
            [window]
            bucket_width_ms = 5000

            [metrics]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.window.bucket_width_ms, 5_000);
        assert_eq!(config.window.window_width_ms, 180_000);
        assert!(!config.metrics.enabled);
        assert_eq!(config.metrics.port, 9090);
    }

    #[test]
    fn test_rejects_zero_bucket_width() {
        let err = PulseConfig::from_toml_str("[window]\nbucket_width_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_too_many_buckets() {
        let err = PulseConfig::from_toml_str(
            "[window]\nwindow_width_ms = 9223372036854775807\nbucket_width_ms = 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_environment_overrides_defaults() {
        std::env::set_var("ORDER_PULSE_WINDOW__BUCKET_WIDTH_MS", "5000");
        std::env::set_var("ORDER_PULSE_HUB__SUBSCRIBER_BUFFER", "32");
        let loaded = PulseConfig::load();
        std::env::remove_var("ORDER_PULSE_WINDOW__BUCKET_WIDTH_MS");
        std::env::remove_var("ORDER_PULSE_HUB__SUBSCRIBER_BUFFER");

        let config = loaded.unwrap();
        assert_eq!(config.window.bucket_width_ms, 5_000);
        assert_eq!(config.hub.subscriber_buffer, 32);
        assert_eq!(config.window.window_width_ms, 180_000);
    }
}
