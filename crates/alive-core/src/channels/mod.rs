pub mod email;
pub mod sms;

use async_trait::async_trait;
use tracing::info;

pub use email::{EmailChannel, EmailSettings, EmailTransportSettings};
pub use sms::WebhookSmsChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    Sms,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Email => f.write_str("email"),
            ChannelKind::Sms => f.write_str("sms"),
        }
    }
}

/// One message for one recipient.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Email address or phone number.
    pub target: String,
    /// Only email carries a subject.
    pub subject: Option<String>,
    pub body: String,
}

/// Delivery channel contract. A send is a single best-effort attempt.
#[async_trait]
pub trait Channel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()>;
}

/// Demo-mode channel: logs the message instead of delivering it.
pub struct LogChannel {
    kind: ChannelKind,
}

impl LogChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Channel for LogChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        info!(
            channel = %self.kind,
            target = %message.target,
            subject = message.subject.as_deref().unwrap_or(""),
            body = %message.body,
            "Notification (log only)"
        );
        Ok(())
    }
}
