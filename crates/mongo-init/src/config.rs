//! Connection settings for the seeder.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connection string used when `MONGODB_URI` is not set.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

/// Environment variable holding the connection string.
pub const URI_ENV: &str = "MONGODB_URI";

/// Environment variable holding the optional execution bound, in seconds.
pub const TIMEOUT_ENV: &str = "MONGO_INIT_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive whole number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

/// Configuration for a seeding run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SeedConfig {
    /// MongoDB connection string.
    pub uri: String,

    /// Upper bound on the whole run. `None` leaves each call to the driver's own timeouts.
    pub timeout_secs: Option<u64>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            timeout_secs: None,
        }
    }
}

impl SeedConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let uri = lookup(URI_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URI.to_string());

        let timeout_secs: Option<u64> = match lookup(TIMEOUT_ENV) {
            Some(raw) if !raw.trim().is_empty() => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: TIMEOUT_ENV,
                        value: raw,
                    });
                }
            },
            _ => None,
        };

        Ok(Self { uri, timeout_secs })
    }

    /// The execution bound as a [`Duration`], if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
