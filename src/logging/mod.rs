//! Logging
//!
//! Structured logging through `tracing`. The deployment environment picks
//! the defaults (text/debug locally, JSON elsewhere); the config file and
//! `RUST_LOG` can override them.

use crate::config::AppEnv;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

/// Logging overrides from the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `tallybot=debug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,
}

/// Effective logging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn resolve(&self, env: AppEnv) -> LogSettings {
        let (level, format) = match env {
            AppEnv::Local => ("debug", LogFormat::Text),
            AppEnv::Dev => ("debug", LogFormat::Json),
            AppEnv::Prod => ("info", LogFormat::Json),
        };
        LogSettings {
            level: self.level.clone().unwrap_or_else(|| level.to_string()),
            format: self.format.unwrap_or(format),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &LogSettings) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(&settings.level).map_err(|e| LoggingError::InvalidFilter {
                filter: settings.level.clone(),
                message: e.to_string(),
            })?
        }
    };

    let result = match settings.format {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    result.map_err(|e| LoggingError::InitError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(
            config.resolve(AppEnv::Local),
            LogSettings {
                level: "debug".to_string(),
                format: LogFormat::Text
            }
        );
        assert_eq!(config.resolve(AppEnv::Dev).format, LogFormat::Json);
        assert_eq!(config.resolve(AppEnv::Prod).level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = LoggingConfig {
            level: Some("warn".to_string()),
            format: Some(LogFormat::Text),
        };
        let settings = config.resolve(AppEnv::Prod);
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.format, LogFormat::Text);
    }

    #[test]
    fn test_deserialize() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"level":"tallybot=trace","format":"json"}"#).unwrap();
        assert_eq!(config.level.as_deref(), Some("tallybot=trace"));
        assert_eq!(config.format, Some(LogFormat::Json));
    }
}
