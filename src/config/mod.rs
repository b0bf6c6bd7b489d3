//! Configuration management

use crate::domain::shared::phone_number::DEFAULT_EMERGENCY_NUMBERS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Prefix for environment overrides, e.g. `CALLCARD__COORDINATOR__TICK_INTERVAL_MS=500`
pub const ENV_PREFIX: &str = "CALLCARD";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub coordinator: CoordinatorConfig,
    pub contacts: ContactsConfig,
    pub telephony: TelephonyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Elapsed-time refresh period
    pub tick_interval_ms: u64,
    /// Capacity of the coordinator's inbound command queue
    pub event_buffer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    pub load_photos: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelephonyConfig {
    /// This device's own number, if known
    pub line_number: Option<String>,
    pub emergency_numbers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub level: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            event_buffer: 256,
        }
    }
}

impl CoordinatorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self { load_photos: true }
    }
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            line_number: None,
            emergency_numbers: DEFAULT_EMERGENCY_NUMBERS
                .iter()
                .map(|n| n.to_string())
                .collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load defaults, then an optional TOML file, then `CALLCARD__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.coordinator.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "coordinator.tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.coordinator.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "coordinator.event_buffer must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.coordinator.tick_interval(), Duration::from_secs(1));
        assert!(config.contacts.load_photos);
        assert!(config.telephony.emergency_numbers.contains(&"911".to_string()));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [coordinator]
            tick_interval_ms = 500

            [telephony]
            line_number = "+16505551234"
            "#,
        )
        .unwrap();

        assert_eq!(config.coordinator.tick_interval_ms, 500);
        assert_eq!(config.coordinator.event_buffer, 256);
        assert_eq!(config.telephony.line_number.as_deref(), Some("+16505551234"));
        assert!(!config.telephony.emergency_numbers.is_empty());
    }

    #[test]
    fn test_rejects_zero_interval() {
        let result = Config::from_toml_str("[coordinator]\ntick_interval_ms = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.coordinator.event_buffer, 256);
    }
}
