//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `start` (default) -- connect to Mattermost and serve poll commands
//! - `check` -- load and validate configuration, then exit
//! - `config show|path` -- inspect configuration
//! - `version` -- print build/version info

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Poll bot for Mattermost.
#[derive(Parser, Debug)]
#[command(
    name = "tallybot",
    version = env!("CARGO_PKG_VERSION"),
    about = "Tallybot, a poll bot for Mattermost"
)]
pub struct Cli {
    /// Path to a JSON5 config file (default: $TALLYBOT_CONFIG or ./tallybot.json5).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bot (default when no subcommand is given).
    Start,

    /// Validate configuration without connecting.
    Check,

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration (secrets redacted) as JSON.
    Show,

    /// Print the resolved configuration file path.
    Path,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

use crate::app;
use crate::config::{self, ConfigError};
use crate::logging;

/// Run the `start` subcommand.
pub async fn handle_start(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config(config_path)?;
    logging::init_logging(&cfg.logging.resolve(cfg.env))?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        env = ?cfg.env,
        backend = ?cfg.storage.backend,
        "Starting tallybot"
    );
    app::run(cfg).await?;
    Ok(())
}

/// Run the `check` subcommand: validate config and open the store.
pub async fn handle_check(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config(config_path)?;
    cfg.validate().map_err(ConfigError::Invalid)?;
    crate::polls::CommandParser::new(&cfg.bot.command_prefix)?;
    app::open_store(&cfg.storage).await?;
    println!("Configuration OK ({:?} storage)", cfg.storage.backend);
    Ok(())
}

/// Run the `config show` subcommand.
pub fn handle_config_show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config(config_path)?;
    let redacted = config::redacted_json(&cfg)?;
    println!("{}", serde_json::to_string_pretty(&redacted)?);
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path(config_path: Option<&Path>) {
    match config::resolve_config_path(config_path) {
        Some(path) => println!("{}", path.display()),
        None => println!("(none; using defaults and environment)"),
    }
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("tallybot {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("TALLYBOT_BUILD_DATE"));
    println!("  Git commit: {}", env!("TALLYBOT_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}
