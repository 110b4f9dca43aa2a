//! Channels
//!
//! Contracts between the poll bot and a chat platform: a source of inbound
//! messages and a sink for replies.

pub mod mattermost;

use async_trait::async_trait;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur in channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Message send failed: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Channel error: {0}")]
    Other(String),
}

/// Incoming chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Platform message ID
    pub id: String,
    /// Chat/room the message was posted in
    pub channel_id: String,
    /// Sender ID
    pub sender_id: String,
    /// Raw message text
    pub text: String,
}

impl IncomingMessage {
    pub fn new(
        channel_id: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            channel_id: channel_id.into(),
            sender_id: sender_id.into(),
            text: text.into(),
        }
    }

    /// Set message ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Outgoing reply, addressed to the channel of the message it answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub channel_id: String,
    pub text: String,
}

/// Stream of inbound messages
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next message. `None` means the stream has ended.
    async fn next_message(&mut self) -> Option<ChannelResult<IncomingMessage>>;
}

/// Best-effort reply delivery
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_reply(&self, channel_id: &str, text: &str) -> ChannelResult<()>;
}
