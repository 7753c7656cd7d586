//! # Structured Logging
//!
//! Installs the global `tracing` subscriber for hosts that do not bring their
//! own. `log` records from the completion SDK are bridged into the same
//! subscriber.

use std::sync::atomic::{AtomicBool, Ordering};

use completion_sdk::config::{ConfigProvider, ConfigProviderExt};
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::{DetectionError, Result};

// Flag to track if logging has been initialized
static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// The log level or filter directives (trace, debug, info, warn, error)
    pub level: String,
    /// The service name for identification
    pub service_name: String,
    /// Whether to use JSON formatting
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "crisis-detection".to_string(),
            json_format: true,
        }
    }
}

impl LoggingConfig {
    /// Read `log_level`, `log_service_name` and `log_format` (`json` or `text`)
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Self {
        let defaults = Self::default();
        Self {
            level: provider.get_string_or("log_level", &defaults.level),
            service_name: provider.get_string_or("log_service_name", &defaults.service_name),
            json_format: !provider
                .get_string_or("log_format", "json")
                .eq_ignore_ascii_case("text"),
        }
    }
}

/// Initializes the structured logging system.
///
/// `RUST_LOG` takes precedence over `config.level`. Only the first call does
/// any work, even when several race; every later call is a no-op. The first
/// call fails if the host already installed a different global subscriber.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<()> {
    if LOGGING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(());
    }

    let config = config.unwrap_or_default();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},warn", config.level)));

    let subscriber = Registry::default().with(filter);

    let installed = if config.json_format {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    };

    installed.map_err(|e| {
        DetectionError::configuration(format!("Failed to set global subscriber: {}", e))
    })?;

    tracing::info!(
        service = %config.service_name,
        json = config.json_format,
        "Logging initialized"
    );

    Ok(())
}
