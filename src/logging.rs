//! # Structured Logging Module
//!
//! Environment-aware structured logging for hosts embedding the registry.
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the host, which may call [`init_structured_logging`] for a sensible
//! default.

use crate::host::ModuleId;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging once per process
///
/// `RUST_LOG` wins when set; otherwise the level follows the environment name.
/// `CONNECTOR_REGISTRY_LOG_FORMAT=json` switches to JSON lines.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var("CONNECTOR_REGISTRY_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter)
                .boxed()
        };

        // A host may already own the global subscriber.
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized, keeping it");
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var("CONNECTOR_REGISTRY_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "warn",
        _ => "debug",
    }
}

/// Log a module contributing or withdrawing capability instances
pub fn log_module_transition(
    operation: &str,
    module_id: ModuleId,
    module_name: &str,
    capability: &str,
    instances: usize,
) {
    tracing::info!(
        operation = %operation,
        module_id = %module_id,
        module = %module_name,
        capability = %capability,
        instances = instances,
        timestamp = %Utc::now().to_rfc3339(),
        "MODULE_TRANSITION"
    );
}
