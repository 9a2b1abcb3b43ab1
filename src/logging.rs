//! # Structured Logging Module
//!
//! Environment-aware structured logging for task sessions. Output goes to the
//! console, either human readable or as JSON lines.

use crate::config::LoggingConfig;
use std::sync::OnceLock;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};
use uuid::Uuid;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = build_filter(config, &environment);

        let console_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A global subscriber may already be installed by the embedding application
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// RUST_LOG wins, then the configured level, then the environment default
fn build_filter(config: &LoggingConfig, environment: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directive = config
        .level
        .clone()
        .unwrap_or_else(|| get_log_level(environment).to_string());
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(get_log_level(environment)))
}

fn get_environment() -> String {
    std::env::var("PHARMADESK_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for task operations
pub fn log_task_operation(operation: &str, task_id: Uuid, status: &str, details: Option<&str>) {
    tracing::info!(
        operation = %operation,
        task_id = %task_id,
        status = %status,
        details = details,
        "TASK_OPERATION"
    );
}

/// Log an error with full context
pub fn log_error(component: &str, operation: &str, error: &str, task_id: Option<Uuid>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        task_id = task_id.map(|id| id.to_string()),
        "ERROR"
    );
}
