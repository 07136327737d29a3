//! Configuration structures for the cycle clock host.
//!
//! Supports TOML deserialization with sensible defaults for
//! development and explicit values for production deployment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level clock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Cycle length used when a new clock is initialized.
    #[serde(with = "humantime_serde")]
    pub initial_length: Duration,

    /// Path to the checkpoint file holding the clock state.
    pub state_file: PathBuf,

    /// Who may change the cycle length.
    pub authorization: AuthorizationConfig,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            initial_length: Duration::from_secs(3600),
            state_file: PathBuf::from("cycle-state.json"),
            authorization: AuthorizationConfig::default(),
        }
    }
}

/// Length-change authorization configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Actors allowed to request a length change. Empty denies everyone.
    pub allowed_actors: Vec<String>,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            allowed_actors: vec![String::from("admin")],
        }
    }
}

impl ClockConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check that the configured values can build a clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the initial length is not a positive
    /// whole number of seconds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        whole_seconds(self.initial_length).map(|_| ())
    }

    /// Initial cycle length in seconds.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ClockConfig::validate`].
    pub fn initial_length_secs(&self) -> Result<u64, ConfigError> {
        whole_seconds(self.initial_length)
    }
}

/// Convert a duration to whole, positive seconds.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for zero or fractional durations.
pub fn whole_seconds(duration: Duration) -> Result<u64, ConfigError> {
    if duration.subsec_nanos() != 0 {
        return Err(ConfigError::Invalid(format!(
            "cycle length {} is not a whole number of seconds",
            humantime::format_duration(duration)
        )));
    }
    match duration.as_secs() {
        0 => Err(ConfigError::Invalid(String::from(
            "cycle length must be at least 1s",
        ))),
        secs => Ok(secs),
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Semantically invalid value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
