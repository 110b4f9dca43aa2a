//! Mattermost Channel
//!
//! Mattermost self-hosted messaging platform integration. Replies go out
//! through the REST API; posts come in over the websocket event stream.

use super::{ChannelError, ChannelResult, IncomingMessage, MessageSource, ReplySink};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

/// Mattermost configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MattermostConfig {
    /// Mattermost server URL
    #[serde(default)]
    pub server_url: String,
    /// Bot access token
    #[serde(default)]
    pub bot_token: String,
}

/// Mattermost errors
#[derive(Debug, Error)]
pub enum MattermostError {
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<MattermostError> for ChannelError {
    fn from(e: MattermostError) -> Self {
        match e {
            MattermostError::InvalidUrl(m) => ChannelError::InvalidConfig(m),
            MattermostError::Api { status: 401, message } => {
                ChannelError::AuthenticationFailed(message)
            }
            MattermostError::Connection(m) | MattermostError::WebSocket(m) => {
                ChannelError::ConnectionFailed(m)
            }
            other => ChannelError::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MattermostUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MattermostPost {
    #[serde(default)]
    id: String,
    user_id: String,
    channel_id: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct WebSocketEvent {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Mattermost channel implementation
pub struct MattermostChannel {
    config: MattermostConfig,
    server_url: Url,
    client: reqwest::Client,
}

impl MattermostChannel {
    /// Create a new Mattermost channel
    pub fn new(config: MattermostConfig) -> Result<Self, MattermostError> {
        let server_url = Url::parse(config.server_url.trim_end_matches('/'))
            .map_err(|e| MattermostError::InvalidUrl(format!("{}: {}", config.server_url, e)))?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(MattermostError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                server_url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MattermostError::Connection(e.to_string()))?;

        Ok(Self {
            config,
            server_url,
            client,
        })
    }

    /// REST endpoint under `/api/v4`
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/v4/{}",
            self.server_url.as_str().trim_end_matches('/'),
            path
        )
    }

    /// Websocket endpoint, `ws` for `http` servers and `wss` for `https`
    pub fn websocket_url(&self) -> Result<Url, MattermostError> {
        let mut url = self.server_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| MattermostError::InvalidUrl(self.config.server_url.clone()))?;
        let path = format!("{}/api/v4/websocket", url.path().trim_end_matches('/'));
        url.set_path(&path);
        Ok(url)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MattermostError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        Err(MattermostError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// ID of the account the bot token belongs to
    pub async fn me(&self) -> Result<String, MattermostError> {
        let response = self
            .client
            .get(self.api_url("users/me"))
            .bearer_auth(&self.config.bot_token)
            .send()
            .await
            .map_err(|e| MattermostError::Connection(e.to_string()))?;

        let user: MattermostUser = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MattermostError::Decode(e.to_string()))?;

        Ok(user.id)
    }

    /// Post a message to a channel, returning the new post ID
    pub async fn create_post(&self, channel_id: &str, message: &str) -> Result<String, MattermostError> {
        let body = serde_json::json!({
            "channel_id": channel_id,
            "message": message,
        });

        let response = self
            .client
            .post(self.api_url("posts"))
            .bearer_auth(&self.config.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| MattermostError::Connection(e.to_string()))?;

        let post: MattermostPost = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| MattermostError::Decode(e.to_string()))?;

        Ok(post.id)
    }

    /// Open the websocket event stream and authenticate it
    pub async fn subscribe(&self) -> Result<MattermostEvents, MattermostError> {
        let url = self.websocket_url()?;
        info!(url = %url, "Connecting to Mattermost websocket");

        let (mut stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| MattermostError::WebSocket(e.to_string()))?;

        let challenge = serde_json::json!({
            "seq": 1,
            "action": "authentication_challenge",
            "data": { "token": self.config.bot_token },
        });
        stream
            .send(Message::Text(challenge.to_string().into()))
            .await
            .map_err(|e| MattermostError::WebSocket(e.to_string()))?;

        Ok(MattermostEvents { stream })
    }
}

#[async_trait]
impl ReplySink for MattermostChannel {
    async fn send_reply(&self, channel_id: &str, text: &str) -> ChannelResult<()> {
        self.create_post(channel_id, text)
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }
}

/// Decode one websocket frame.
///
/// Returns `None` for anything other than a `posted` event, including the
/// server's replies to our own actions.
pub fn decode_event(text: &str) -> Result<Option<IncomingMessage>, MattermostError> {
    let event: WebSocketEvent =
        serde_json::from_str(text).map_err(|e| MattermostError::Decode(e.to_string()))?;

    if event.event.as_deref() != Some("posted") {
        return Ok(None);
    }

    // The post is JSON encoded inside a string field
    let raw_post = event
        .data
        .get("post")
        .and_then(|p| p.as_str())
        .ok_or_else(|| MattermostError::Decode("posted event without post data".to_string()))?;
    let post: MattermostPost =
        serde_json::from_str(raw_post).map_err(|e| MattermostError::Decode(e.to_string()))?;

    Ok(Some(
        IncomingMessage::new(post.channel_id, post.user_id, post.message).with_id(post.id),
    ))
}

/// Authenticated Mattermost event stream
pub struct MattermostEvents {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl MattermostEvents {
    /// Close the websocket
    pub async fn close(mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Websocket close failed");
        }
    }
}

#[async_trait]
impl MessageSource for MattermostEvents {
    async fn next_message(&mut self) -> Option<ChannelResult<IncomingMessage>> {
        while let Some(frame) = self.stream.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => return Some(Err(MattermostError::WebSocket(e.to_string()).into())),
            };

            match frame {
                Message::Text(text) => match decode_event(text.as_str()) {
                    Ok(Some(message)) => return Some(Ok(message)),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Skipping undecodable Mattermost event"),
                },
                Message::Close(frame) => {
                    info!(frame = ?frame, "Mattermost websocket closed by server");
                    return None;
                }
                _ => {}
            }
        }
        None
    }
}
