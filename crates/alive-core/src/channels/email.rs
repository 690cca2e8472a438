use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::warn;

use super::{Channel, ChannelKind, OutboundMessage};

#[derive(Debug, Clone)]
pub enum EmailTransportSettings {
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
        use_tls: bool,
    },
    /// Writes each message as a file; for development.
    File { dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub transport: EmailTransportSettings,
    pub from_email: String,
    pub from_name: String,
}

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// HTML email delivery through lettre.
pub struct EmailChannel {
    transport: Transport,
    from: Mailbox,
}

impl EmailChannel {
    pub fn new(settings: &EmailSettings) -> anyhow::Result<Self> {
        let transport = match &settings.transport {
            EmailTransportSettings::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    warn!("SMTP TLS is disabled - this is not recommended for production");
                }
                let builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .with_context(|| format!("create SMTP transport for {host}"))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                };
                let transport = builder
                    .port(*port)
                    .credentials(Credentials::new(username.clone(), password.clone()))
                    .build();
                Transport::Smtp(transport)
            }
            EmailTransportSettings::File { dir } => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("create emails directory {}", dir.display()))?;
                Transport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
        };

        let from = format!("{} <{}>", settings.from_name, settings.from_email)
            .parse::<Mailbox>()
            .context("parse sender address")?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Channel for EmailChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        let to = message
            .target
            .parse::<Mailbox>()
            .with_context(|| format!("parse recipient '{}'", message.target))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone().unwrap_or_default())
            .header(ContentType::TEXT_HTML)
            .body(message.body.clone())
            .context("build email message")?;

        match &self.transport {
            Transport::Smtp(smtp) => {
                smtp.send(email).await.context("send SMTP email")?;
            }
            Transport::File(file) => {
                file.send(email).await.context("write email file")?;
            }
        }
        Ok(())
    }
}
