//! Client configuration.
//!
//! Values come from code through the `with_*` builders, or from the
//! environment (and a `.env` file, if present) through
//! [`ClientConfig::from_env`].
//!
//! # Environment Variables
//!
//! | variable | field | default |
//! |---|---|---|
//! | `QUIZZICAL_VALIDATION_TIMEOUT_MS` | `validation_timeout` | 2000 |
//! | `QUIZZICAL_POLL_INTERVAL_MS` | `poll_interval` | 5 |
//! | `QUIZZICAL_CACHE_DIR` | `cache_directory` | unset |
//! | `QUIZZICAL_LOG` | `log_filter` | `info,quizzical=debug` |

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::coordinator::{ContractViolation, DEFAULT_POLL_INTERVAL, ValidationCoordinator};

/// Default bound on how long a submission waits for field validations.
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info,quizzical=debug";

const VALIDATION_TIMEOUT_KEY: &str = "QUIZZICAL_VALIDATION_TIMEOUT_MS";
const POLL_INTERVAL_KEY: &str = "QUIZZICAL_POLL_INTERVAL_MS";
const CACHE_DIRECTORY_KEY: &str = "QUIZZICAL_CACHE_DIR";
const LOG_FILTER_KEY: &str = "QUIZZICAL_LOG";

/// Configuration loading failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set to something unusable.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The variable name.
        key: String,
        /// Why the value was rejected.
        message: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Tunables for forms, caching and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long a submission waits for pending field validations.
    pub validation_timeout: Duration,
    /// Delay between two checks of the coordinator's live set.
    pub poll_interval: Duration,
    /// Directory for the JSON cache files. `None` keeps the cache in memory.
    pub cache_directory: Option<PathBuf>,
    /// `tracing` filter directive used by [`telemetry::init`](crate::telemetry::init).
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cache_directory: None,
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl ClientConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the validation timeout.
    #[must_use]
    pub const fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    /// Sets the coordinator poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the cache directory.
    #[must_use]
    pub fn with_cache_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(directory.into());
        self
    }

    /// Sets the log filter directive.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Loads `.env` if present, then reads the environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a duration is not a whole
    /// number of milliseconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                tracing::warn!("Failed to load .env file: {}", error);
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            validation_timeout: parse_millis(VALIDATION_TIMEOUT_KEY, lookup(VALIDATION_TIMEOUT_KEY))?
                .unwrap_or(defaults.validation_timeout),
            poll_interval: parse_millis(POLL_INTERVAL_KEY, lookup(POLL_INTERVAL_KEY))?
                .unwrap_or(defaults.poll_interval),
            cache_directory: lookup(CACHE_DIRECTORY_KEY)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            log_filter: lookup(LOG_FILTER_KEY)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.log_filter),
        })
    }

    /// Returns the path of the cache file for `family`, if a cache directory
    /// is configured.
    #[must_use]
    pub fn cache_file(&self, family: &str) -> Option<PathBuf> {
        self.cache_directory
            .as_deref()
            .map(|directory: &Path| directory.join(format!("{family}.json")))
    }

    /// Builds a coordinator on the current runtime with the configured poll
    /// interval.
    ///
    /// # Errors
    ///
    /// Returns [`ContractViolation::NoRuntime`] outside a tokio runtime.
    pub fn coordinator(&self) -> Result<ValidationCoordinator, ContractViolation> {
        ValidationCoordinator::try_current()
            .map(|coordinator| coordinator.with_poll_interval(self.poll_interval))
    }
}

fn parse_millis(key: &str, value: Option<String>) -> Result<Option<Duration>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|error| ConfigError::invalid_value(key, format!("{error} (got {raw:?})")))
        })
        .transpose()
}
