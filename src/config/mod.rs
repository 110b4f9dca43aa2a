//! Configuration loading
//!
//! An optional JSON5 file provides the base configuration; environment
//! variables override individual values on top of it.

pub mod types;

pub use types::{AppEnv, BotConfig, Config, StorageBackend, StorageConfig, ValidationError};

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tallybot.json5";

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "TALLYBOT_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidEnv { key: String, message: String },

    #[error("Invalid configuration: {}", format_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Pick the config file: explicit path, then `TALLYBOT_CONFIG`, then
/// `tallybot.json5` in the working directory if it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

/// Load configuration from file (if any) and the process environment
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => load_config_file(&path)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Parse a JSON5 config file
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    json5::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Apply environment overrides using `lookup` to read variables
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let invalid = |key: &str, message: String| ConfigError::InvalidEnv {
        key: key.to_string(),
        message,
    };

    if let Some(env) = lookup("APP_ENV") {
        config.env = env.parse().map_err(|e| invalid("APP_ENV", e))?;
    }
    if let Some(url) = lookup("MATTERMOST_URL") {
        config.mattermost.server_url = url;
    }
    if let Some(token) = lookup("BOT_TOKEN") {
        config.mattermost.bot_token = token;
    }
    if let Some(backend) = lookup("STORAGE_BACKEND") {
        config.storage.backend = backend.parse().map_err(|e| invalid("STORAGE_BACKEND", e))?;
    }
    if let Some(url) = lookup("STORAGE_URL") {
        config.storage.url = Some(url);
    }
    if let Some(locale) = lookup("BOT_LOCALE") {
        config.bot.locale = locale.parse().map_err(|e| invalid("BOT_LOCALE", e))?;
    }
    if let Some(prefix) = lookup("COMMAND_PREFIX") {
        config.bot.command_prefix = prefix;
    }
    Ok(())
}

/// Keys whose values are hidden when printing config
const SECRET_KEYS: &[&str] = &["token", "secret", "password"];

/// Configuration as JSON with secrets replaced
pub fn redacted_json(config: &Config) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(config)?;
    redact_secrets(&mut value);
    Ok(value)
}

fn redact_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                let lower = key.to_ascii_lowercase();
                if SECRET_KEYS.iter().any(|s| lower.contains(s)) {
                    if v.as_str().is_some_and(|s| !s.is_empty()) {
                        *v = Value::String("[REDACTED]".to_string());
                    }
                } else {
                    redact_secrets(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}
