//! Typed configuration structures
//!
//! Provides strongly-typed access to configuration values with validation
//! and default values.

use crate::channels::mattermost::MattermostConfig;
use crate::logging::LoggingConfig;
use crate::polls::Locale;
use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Deployment environment
    #[serde(default)]
    pub env: AppEnv,

    /// Mattermost connection
    #[serde(default)]
    pub mattermost: MattermostConfig,

    /// Poll storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Command and reply settings
    #[serde(default)]
    pub bot: BotConfig,

    /// Logging overrides
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.mattermost.server_url.trim().is_empty() {
            errors.push(ValidationError::new(
                "mattermost.serverUrl",
                "is required (or set MATTERMOST_URL)",
            ));
        } else if let Err(e) = Url::parse(&self.mattermost.server_url) {
            errors.push(ValidationError::new(
                "mattermost.serverUrl",
                format!("is not a valid URL: {}", e),
            ));
        }

        if self.mattermost.bot_token.trim().is_empty() {
            errors.push(ValidationError::new(
                "mattermost.botToken",
                "is required (or set BOT_TOKEN)",
            ));
        }

        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::new("storage", e));
        }

        if let Err(e) = self.bot.validate() {
            errors.push(ValidationError::new("bot", e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Deployment environment, selects logging defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppEnv {
    #[default]
    Local,
    Dev,
    Prod,
}

impl std::str::FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "local" => Ok(AppEnv::Local),
            "dev" | "development" => Ok(AppEnv::Dev),
            "prod" | "production" => Ok(AppEnv::Prod),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(format!("Unknown storage backend: {}", other)),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database URL, e.g. `sqlite://tallybot.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self.backend {
            StorageBackend::Memory => Ok(()),
            StorageBackend::Sqlite => match self.url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => Ok(()),
                _ => Err("sqlite backend requires url (or set STORAGE_URL)".to_string()),
            },
        }
    }
}

/// Command and reply settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Prefix in front of every command keyword
    #[serde(default = "default_prefix")]
    pub command_prefix: String,
    /// Reply language
    #[serde(default)]
    pub locale: Locale,
    /// Remove a poll's votes when the poll is deleted
    #[serde(default = "default_true")]
    pub cascade_delete_votes: bool,
}

fn default_prefix() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: default_prefix(),
            locale: Locale::default(),
            cascade_delete_votes: true,
        }
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.command_prefix.trim().is_empty() {
            return Err("commandPrefix must not be empty".to_string());
        }
        if self.command_prefix.chars().any(char::is_whitespace) {
            return Err("commandPrefix must not contain whitespace".to_string());
        }
        Ok(())
    }
}
