//! Configuration Loader
//!
//! Environment-aware loading: `pharmadesk.toml` from the config directory,
//! then `environments/<env>.toml`, then `PHARMADESK__SECTION__FIELD`
//! environment variables, later layers winning.

use super::error::{ConfigResult, ConfigurationError};
use super::DashboardConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BASE_CONFIG_FILE: &str = "pharmadesk.toml";
const ENVIRONMENTS_DIR: &str = "environments";
const ENV_PREFIX: &str = "PHARMADESK";

/// Loaded configuration together with where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: DashboardConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_layers(Self::default_config_directory(), &environment, false)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Useful for tests that must not touch global environment variables.
    pub fn load_from_directory_with_env(
        config_dir: impl Into<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.into();
        if !config_directory.is_dir() {
            return Err(ConfigurationError::DirectoryNotFound {
                path: config_directory,
            });
        }
        Self::load_layers(config_directory, environment, true)
    }

    fn load_layers(
        config_directory: PathBuf,
        environment: &str,
        require_base: bool,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let base_file = config_directory.join(BASE_CONFIG_FILE);
        let env_file = config_directory
            .join(ENVIRONMENTS_DIR)
            .join(format!("{environment}.toml"));

        debug!(
            environment = environment,
            base_file = %base_file.display(),
            env_file = %env_file.display(),
            "Loading configuration"
        );

        let config: DashboardConfig = Config::builder()
            .add_source(File::from(base_file.as_path()).required(require_base))
            .add_source(File::from(env_file.as_path()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        info!(
            environment = environment,
            base_url = %config.service.base_url,
            watchdog_enabled = config.watchdog.enabled,
            watchdog_buffer_seconds = config.watchdog.buffer_seconds,
            "Configuration loaded successfully"
        );
        debug!(config = %Self::sanitize_config_for_logging(&config), "Effective configuration");

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Configuration as JSON with secrets masked, for debugging output
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// PHARMADESK_ENV || APP_ENV || "development"
    pub fn detect_environment() -> String {
        env::var("PHARMADESK_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn default_config_directory() -> PathBuf {
        env::var("PHARMADESK_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn sanitize_config_for_logging(config: &DashboardConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        let sensitive_patterns = ["password", "secret", "key", "token", "credential"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        if !val.is_null() {
                            *val = serde_json::Value::String("[MASKED]".to_string());
                        }
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(items) => {
                for item in items.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_environment_override_wins_over_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(BASE_CONFIG_FILE),
            r#"
[service]
base_url = "https://tasks.pharmacy.test"
max_retries = 5

[watchdog]
buffer_seconds = 30
"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join(ENVIRONMENTS_DIR)).unwrap();
        fs::write(
            dir.path().join(ENVIRONMENTS_DIR).join("staging.toml"),
            "[watchdog]\nbuffer_seconds = 15\n",
        )
        .unwrap();

        let manager = ConfigManager::load_from_directory_with_env(dir.path(), "staging").unwrap();
        let config = manager.config();
        assert_eq!(config.service.base_url, "https://tasks.pharmacy.test");
        assert_eq!(config.service.max_retries, 5);
        assert_eq!(config.watchdog.buffer_seconds, 15);
        // Untouched sections keep their defaults
        assert!(config.watchdog.enabled);
        assert_eq!(config.service.timeout_ms, 30_000);
        assert_eq!(manager.environment(), "staging");
    }

    #[test]
    fn test_missing_base_file_is_an_error_for_explicit_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigManager::load_from_directory_with_env(dir.path(), "test").is_err());
        assert!(matches!(
            ConfigManager::load_from_directory_with_env(dir.path().join("nope"), "test"),
            Err(ConfigurationError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(BASE_CONFIG_FILE),
            "[service]\nbase_url = \"tasks.pharmacy.test\"\n",
        )
        .unwrap();

        let err = ConfigManager::load_from_directory_with_env(dir.path(), "test").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }

    #[test]
    fn test_debug_config_masks_token() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(BASE_CONFIG_FILE),
            "[service]\nbearer_token = \"very-secret-token\"\n",
        )
        .unwrap();

        let manager = ConfigManager::load_from_directory_with_env(dir.path(), "test").unwrap();
        let debug = manager.debug_config();
        assert_eq!(debug["service"]["bearer_token"], "[MASKED]");
        assert_eq!(
            manager.config().service.bearer_token.as_deref(),
            Some("very-secret-token")
        );
    }
}
