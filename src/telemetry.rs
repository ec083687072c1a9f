//! Installs the process-wide `tracing` subscriber.
//!
//! Library code only emits events; the embedding application decides
//! whether to call [`init`].

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::ClientConfig;

/// Subscriber installation failures.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive does not parse.
    #[error("Invalid log filter {filter:?}: {message}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// A global subscriber is already installed.
    #[error("Tracing subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Installs a registry with an [`EnvFilter`] and a formatting layer.
///
/// `RUST_LOG` wins over the configured filter when it is set.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if `config.log_filter` is not a
/// valid directive and [`TelemetryError::AlreadyInstalled`] if called twice.
pub fn init(config: &ClientConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter(&config.log_filter)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .map_err(|error| TelemetryError::AlreadyInstalled(error.to_string()))?;

    tracing::debug!(filter = %config.log_filter, "Tracing initialized");
    Ok(())
}

fn filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|error| TelemetryError::InvalidFilter {
        filter: directive.to_owned(),
        message: error.to_string(),
    })
}
