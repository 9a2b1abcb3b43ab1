//! # Pharmadesk Configuration
//!
//! Layered configuration for the task core: a base TOML file, an optional
//! per-environment override, then `PHARMADESK__`-prefixed environment
//! variables. Every field has a default so an empty layer set still yields a
//! usable configuration.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pharmadesk_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let buffer = manager.config().watchdog.buffer();
//! let base_url = &manager.config().service.base_url;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_WATCHDOG_BUFFER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring config/pharmadesk.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// External task/workflow service connection
    pub service: ServiceConfig,

    /// Deadline watchdog behavior
    pub watchdog: WatchdogConfig,

    /// Session event channel
    pub events: EventsConfig,

    /// Structured logging
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the dashboard REST API
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Total attempts for idempotent reads, the first request included
    /// (`1` disables retrying). Mutations are always sent once.
    pub max_retries: u32,
    /// First backoff delay; doubles per attempt
    pub retry_base_delay_ms: u64,
    /// Sent as `Authorization: Bearer <token>` when present
    pub bearer_token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30_000,
            max_retries: 3,
            retry_base_delay_ms: 500,
            bearer_token: None,
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchdogConfig {
    pub enabled: bool,
    /// Seconds before the deadline at which open tasks are auto-submitted
    pub buffer_seconds: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_seconds: DEFAULT_WATCHDOG_BUFFER.as_secs(),
        }
    }
}

impl WatchdogConfig {
    pub fn buffer(&self) -> Duration {
        Duration::from_secs(self.buffer_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; falls back to an environment-derived level
    pub level: Option<String>,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl DashboardConfig {
    /// Validate the loaded configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let base_url = self.service.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigurationError::invalid_value(
                "service.base_url",
                &self.service.base_url,
                "must be an http(s) URL",
            ));
        }

        if self.service.timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "service.timeout_ms",
                self.service.timeout_ms,
                "must be greater than zero",
            ));
        }

        if self.service.max_retries == 0 {
            return Err(ConfigurationError::invalid_value(
                "service.max_retries",
                self.service.max_retries,
                "at least one attempt is required",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                self.events.channel_capacity,
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.watchdog.buffer(), Duration::from_secs(10));
        assert!(config.watchdog.enabled);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = DashboardConfig::default();
        config.service.base_url = "ftp://tasks".to_string();
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::default();
        config.service.max_retries = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("service.max_retries"));
    }
}
