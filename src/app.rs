//! Application wiring
//!
//! Builds the store, engine and Mattermost connection from configuration
//! and runs the message loop until shutdown.

use crate::bot::PollBot;
use crate::channels::mattermost::{MattermostChannel, MattermostError};
use crate::channels::{MessageSource, ReplySink};
use crate::config::{Config, ConfigError, StorageBackend, StorageConfig};
use crate::polls::{CommandParser, EngineSettings, PollEngine, ReplyFormatter};
use crate::storage::{DynPollStore, MemoryStore, SqliteStore, StoreError};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Mattermost error: {0}")]
    Mattermost(#[from] MattermostError),

    #[error("Invalid command prefix: {0}")]
    Parser(#[from] regex::Error),

    #[error("Event stream closed")]
    EventStreamClosed,
}

/// Open the configured poll store
pub async fn open_store(config: &StorageConfig) -> Result<DynPollStore, StoreError> {
    match config.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; polls are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| StoreError::Backend("sqlite backend requires url".to_string()))?;
            let store = SqliteStore::connect(url, config.max_connections).await?;
            info!(url = %url, "SQLite store ready");
            Ok(Arc::new(store))
        }
    }
}

/// Build the poll bot for a known bot user ID
pub fn build_bot(config: &Config, self_id: &str, store: DynPollStore) -> Result<PollBot, AppError> {
    let parser = CommandParser::new(&config.bot.command_prefix)?;
    let engine = PollEngine::new(store).with_settings(EngineSettings {
        cascade_delete_votes: config.bot.cascade_delete_votes,
    });
    let formatter = ReplyFormatter::new(config.bot.locale, config.bot.command_prefix.clone());
    Ok(PollBot::new(self_id, parser, engine, formatter))
}

/// Connect to Mattermost and serve poll commands until a shutdown signal
pub async fn run(config: Config) -> Result<(), AppError> {
    config.validate().map_err(ConfigError::Invalid)?;

    let store = open_store(&config.storage).await?;
    let channel = MattermostChannel::new(config.mattermost.clone())?;

    let self_id = channel.me().await?;
    info!(user_id = %self_id, "Authenticated with Mattermost");

    let bot = build_bot(&config, &self_id, store)?;
    let mut events = channel.subscribe().await?;
    info!(
        prefix = %config.bot.command_prefix,
        locale = ?config.bot.locale,
        "Poll bot started"
    );

    let result = serve(&bot, &mut events, &channel, shutdown_signal()).await;
    events.close().await;
    info!("Poll bot stopped");
    result
}

/// Process messages one at a time until the source ends or `shutdown` completes.
///
/// A message already being handled runs to completion before shutdown is
/// observed. Reply delivery failures are logged and do not stop the loop.
pub async fn serve<S, F>(
    bot: &PollBot,
    source: &mut S,
    sink: &dyn ReplySink,
    shutdown: F,
) -> Result<(), AppError>
where
    S: MessageSource + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                return Ok(());
            }
            next = source.next_message() => next,
        };

        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                error!(error = %e, "Failed to receive message");
                continue;
            }
            None => return Err(AppError::EventStreamClosed),
        };

        debug!(
            message_id = %message.id,
            channel_id = %message.channel_id,
            "Message received"
        );

        let Some(reply) = bot.handle_message(&message).await else {
            continue;
        };

        if let Err(e) = sink.send_reply(&reply.channel_id, &reply.text).await {
            error!(
                channel_id = %reply.channel_id,
                error = %e,
                "Failed to deliver reply"
            );
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
