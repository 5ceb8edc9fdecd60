//! Push notification channels.
//!
//! Each [`Channel`] is an independently optional destination. Senders never
//! panic and never retry: one call is one delivery attempt, and a bad
//! destination is reported as [`NotifyError::InvalidDestination`] before any
//! network traffic happens.

pub mod bark;
pub mod message_pusher;
pub mod selftest;
pub mod serverchan;
pub mod wechatwork;

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::AppError;

/// Title used for every notification this tool sends.
pub const REPORT_TITLE: &str = "【森空岛每日签到】";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    ServerChan,
    Bark,
    MessagePusher,
    WeChatWork,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::ServerChan => write!(f, "ServerChan"),
            ChannelKind::Bark => write!(f, "Bark"),
            ChannelKind::MessagePusher => write!(f, "MessagePusher"),
            ChannelKind::WeChatWork => write!(f, "WeChatWork"),
        }
    }
}

/// A configured notification destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    ServerChan { send_key: String },
    Bark { url: String },
    MessagePusher { url: String },
    WeChatWork { url: String },
}

impl Channel {
    pub fn kind(&self) -> ChannelKind {
        match self {
            Channel::ServerChan { .. } => ChannelKind::ServerChan,
            Channel::Bark { .. } => ChannelKind::Bark,
            Channel::MessagePusher { .. } => ChannelKind::MessagePusher,
            Channel::WeChatWork { .. } => ChannelKind::WeChatWork,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid {kind} destination: {reason}")]
    InvalidDestination { kind: ChannelKind, reason: String },

    #[error("{kind} request failed: {source}")]
    Http {
        kind: ChannelKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{kind} returned status {status}: {body}")]
    Status {
        kind: ChannelKind,
        status: u16,
        body: String,
    },

    #[error("{kind} rejected the message: {message}")]
    Rejected { kind: ChannelKind, message: String },
}

/// Delivers one message to one channel.
#[allow(async_fn_in_trait)]
pub trait NotificationSender {
    async fn send(&self, channel: &Channel, title: &str, body: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone)]
pub struct NotifierOptions {
    /// Reject webhook URLs that are not `https://`.
    pub require_https: bool,
    pub serverchan_base: String,
    pub request_timeout: Duration,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            require_https: true,
            serverchan_base: serverchan::DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// [`NotificationSender`] backed by reqwest.
pub struct HttpNotifier {
    client: Client,
    options: NotifierOptions,
}

impl HttpNotifier {
    pub fn new(options: NotifierOptions) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self { client, options })
    }

    pub(crate) fn check_url(&self, kind: ChannelKind, url: &str) -> Result<(), NotifyError> {
        let ok = url.starts_with("https://")
            || (!self.options.require_https && url.starts_with("http://"));
        if ok {
            Ok(())
        } else {
            Err(NotifyError::InvalidDestination {
                kind,
                reason: format!("webhook URL must start with https://, got {url:?}"),
            })
        }
    }
}

impl NotificationSender for HttpNotifier {
    async fn send(&self, channel: &Channel, title: &str, body: &str) -> Result<(), NotifyError> {
        match channel {
            Channel::ServerChan { send_key } => {
                serverchan::send(&self.client, &self.options.serverchan_base, send_key, title, body)
                    .await
            }
            Channel::Bark { url } => {
                self.check_url(ChannelKind::Bark, url)?;
                bark::send(&self.client, url, title, body).await
            }
            Channel::MessagePusher { url } => {
                self.check_url(ChannelKind::MessagePusher, url)?;
                message_pusher::send(&self.client, url, title, body).await
            }
            Channel::WeChatWork { url } => {
                self.check_url(ChannelKind::WeChatWork, url)?;
                wechatwork::send(&self.client, url, title, body).await
            }
        }
    }
}

/// Per-channel outcome of one fan-out.
#[derive(Debug, Default)]
pub struct DeliverySummary {
    pub delivered: Vec<ChannelKind>,
    pub failed: Vec<(ChannelKind, String)>,
}

impl DeliverySummary {
    pub fn attempted(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }
}

/// Sends `title`/`body` to every channel once, in order. A failing channel is
/// logged and recorded; the remaining channels are still attempted.
pub async fn deliver_all<N: NotificationSender>(
    sender: &N,
    channels: &[Channel],
    title: &str,
    body: &str,
) -> DeliverySummary {
    let mut summary = DeliverySummary::default();
    for channel in channels {
        let kind = channel.kind();
        match sender.send(channel, title, body).await {
            Ok(()) => {
                info!(channel = %kind, "notification delivered");
                summary.delivered.push(kind);
            }
            Err(e) => {
                warn!(channel = %kind, error = %e, "notification delivery failed");
                summary.failed.push((kind, e.to_string()));
            }
        }
    }
    summary
}

/// Parses a JSON reply body, tolerating non-JSON replies as `Null`.
pub(crate) async fn read_reply(
    kind: ChannelKind,
    response: reqwest::Response,
) -> Result<serde_json::Value, NotifyError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| NotifyError::Http { kind, source })?;
    if !status.is_success() {
        return Err(NotifyError::Status {
            kind,
            status: status.as_u16(),
            body: text,
        });
    }
    tracing::debug!(channel = %kind, reply = %text, "notification reply");
    Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::Null))
}
