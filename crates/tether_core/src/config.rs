//! Synchronization settings.
//!
//! [`SyncConfig`] holds the defaults every resource and poll schedule starts
//! from. It is plain data: build it with the `with_*` methods or parse it
//! from JSON, then hand it to the resource and transaction layers.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tether_core::config::{ResolutionPolicy, SyncConfig};
//!
//! let config = SyncConfig::from_json(r#"{ "poll_interval_ms": 5000 }"#).unwrap();
//! assert_eq!(config.poll_interval(), Duration::from_secs(5));
//! assert_eq!(config.resolution_policy, ResolutionPolicy::LastIssued);
//! ```

use core::time::Duration;

use serde::{Deserialize, Serialize};

/// How a resource treats overlapping fetches that resolve out of order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// Only the most recently issued fetch may write state; earlier
    /// resolutions are discarded when they arrive.
    #[default]
    LastIssued,
    /// Every resolution writes state in arrival order, so a slow earlier
    /// fetch can overwrite a faster later one.
    LastResolved,
}

/// Errors raised while loading or validating a [`SyncConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid sync config: {0}")]
    Json(#[from] serde_json::Error),

    /// Poll intervals must be strictly positive.
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    /// Generic error messages must be displayable.
    #[error("{0} must not be empty")]
    EmptyErrorMessage(&'static str),
}

/// Defaults for resources, poll schedules and error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Interval between poll ticks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Policy applied when fetches of the same resource overlap.
    pub resolution_policy: ResolutionPolicy,
    /// Whether refetch requests attach to an outstanding fetch for the same
    /// params instead of issuing another view call.
    pub single_flight: bool,
    /// Message shown when a view fails without a displayable message.
    pub query_error_message: String,
    /// Message shown when a transaction fails without a displayable message.
    pub transaction_error_message: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            resolution_policy: ResolutionPolicy::LastIssued,
            single_flight: true,
            query_error_message: "Failed to fetch data".to_owned(),
            transaction_error_message: "Transaction failed".to_owned(),
        }
    }
}

impl SyncConfig {
    /// Creates a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed documents or unknown
    /// fields, and the [`validate`](Self::validate) errors otherwise.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroPollInterval`] if `poll_interval_ms` is zero
    /// - [`ConfigError::EmptyErrorMessage`] if a generic error message is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.query_error_message.trim().is_empty() {
            return Err(ConfigError::EmptyErrorMessage("query_error_message"));
        }
        if self.transaction_error_message.trim().is_empty() {
            return Err(ConfigError::EmptyErrorMessage("transaction_error_message"));
        }
        Ok(())
    }

    /// Returns the poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the resolution policy.
    #[must_use]
    pub fn with_resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.resolution_policy = policy;
        self
    }

    /// Enables or disables single-flight refetching.
    #[must_use]
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Sets the generic query error message.
    #[must_use]
    pub fn with_query_error_message(mut self, message: impl Into<String>) -> Self {
        self.query_error_message = message.into();
        self
    }

    /// Sets the generic transaction error message.
    #[must_use]
    pub fn with_transaction_error_message(mut self, message: impl Into<String>) -> Self {
        self.transaction_error_message = message.into();
        self
    }
}
