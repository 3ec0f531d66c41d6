//! Configuration management utilities

use crate::LogFormat;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Application-level settings shared by the binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "stockchat".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Read `STOCKCHAT_ENV` and `STOCKCHAT_LOG_FORMAT` on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let log_format = match std::env::var("STOCKCHAT_LOG_FORMAT") {
            Ok(value) => match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "STOCKCHAT_LOG_FORMAT".to_string(),
                        value,
                    });
                }
            },
            Err(_) => defaults.log_format,
        };

        Ok(Self {
            app_name: defaults.app_name,
            environment: env_or("STOCKCHAT_ENV", &defaults.environment),
            log_format,
        })
    }
}

/// Read an environment variable, falling back to `default` when unset
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable
///
/// Returns `Ok(None)` when the variable is unset and an error when it is set
/// to something that does not parse.
pub fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
