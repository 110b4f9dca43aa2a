//! Poll Bot
//!
//! Per-message handling: drop our own posts, parse, run the command and
//! format the reply.

use crate::channels::{IncomingMessage, Reply};
use crate::polls::{CommandParser, Parsed, PollEngine, PollError, ReplyFormatter};
use tracing::{debug, error, warn};

pub struct PollBot {
    /// The bot's own user ID; messages from it are ignored
    self_id: String,
    parser: CommandParser,
    engine: PollEngine,
    formatter: ReplyFormatter,
}

impl PollBot {
    pub fn new(
        self_id: impl Into<String>,
        parser: CommandParser,
        engine: PollEngine,
        formatter: ReplyFormatter,
    ) -> Self {
        Self {
            self_id: self_id.into(),
            parser,
            engine,
            formatter,
        }
    }

    /// Handle one message, returning the reply to send if any
    pub async fn handle_message(&self, message: &IncomingMessage) -> Option<Reply> {
        if message.sender_id == self.self_id {
            return None;
        }

        let text = match self.parser.parse(&message.text) {
            Ok(Parsed::Ignored) => return None,
            Ok(Parsed::Guide) => {
                debug!(user_id = %message.sender_id, "Sending guide");
                self.formatter.guide()
            }
            Ok(Parsed::Command(command)) => {
                match self.engine.dispatch(command, &message.sender_id).await {
                    Ok(outcome) => self.formatter.outcome(&outcome),
                    Err(e) => {
                        self.log_failure(message, &e);
                        self.formatter.error(&e)
                    }
                }
            }
            Err(e) => {
                self.log_failure(message, &e);
                self.formatter.error(&e)
            }
        };

        Some(Reply {
            channel_id: message.channel_id.clone(),
            text,
        })
    }

    fn log_failure(&self, message: &IncomingMessage, e: &PollError) {
        if e.is_user_error() {
            warn!(
                user_id = %message.sender_id,
                channel_id = %message.channel_id,
                message = %message.text,
                error = %e,
                "Poll command rejected"
            );
        } else {
            error!(
                user_id = %message.sender_id,
                channel_id = %message.channel_id,
                message = %message.text,
                error = %e,
                "Poll command failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polls::Locale;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn bot() -> PollBot {
        PollBot::new(
            "bot",
            CommandParser::new("/").unwrap(),
            PollEngine::new(Arc::new(MemoryStore::new())),
            ReplyFormatter::new(Locale::En, "/"),
        )
    }

    #[tokio::test]
    async fn test_ignores_own_messages() {
        let bot = bot();
        let message = IncomingMessage::new("chan", "bot", "/guide");
        assert!(bot.handle_message(&message).await.is_none());
    }

    #[tokio::test]
    async fn test_ignores_chatter() {
        let bot = bot();
        let message = IncomingMessage::new("chan", "alice", "good morning");
        assert!(bot.handle_message(&message).await.is_none());
    }

    #[tokio::test]
    async fn test_guide_reply_targets_channel() {
        let bot = bot();
        let reply = bot
            .handle_message(&IncomingMessage::new("chan", "alice", "/guide"))
            .await
            .unwrap();
        assert_eq!(reply.channel_id, "chan");
        assert!(reply.text.contains("/create"));
    }

    #[tokio::test]
    async fn test_malformed_gets_usage() {
        let bot = bot();
        let reply = bot
            .handle_message(&IncomingMessage::new("chan", "alice", "/vote nope"))
            .await
            .unwrap();
        assert!(reply.text.contains("/vote <poll ID> <option number>"));
    }

    #[tokio::test]
    async fn test_unknown_poll() {
        let bot = bot();
        let reply = bot
            .handle_message(&IncomingMessage::new("chan", "alice", "/results nope"))
            .await
            .unwrap();
        assert_eq!(reply.text, "This poll does not exist.");
    }
}
