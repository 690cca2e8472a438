use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::{Channel, ChannelKind, OutboundMessage};

#[derive(Serialize)]
struct SmsPayload<'a> {
    to: &'a str,
    message: &'a str,
}

/// Hands text messages to an SMS gateway as `POST {to, message}` JSON.
pub struct WebhookSmsChannel {
    client: reqwest::Client,
    url: String,
}

impl WebhookSmsChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Channel for WebhookSmsChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(&SmsPayload {
                to: &message.target,
                message: &message.body,
            })
            .send()
            .await
            .with_context(|| format!("reach SMS gateway {}", self.url))?
            .error_for_status()
            .context("SMS gateway rejected message")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> OutboundMessage {
        OutboundMessage {
            target: "555-0100".into(),
            subject: None,
            body: "alice checked in".into(),
        }
    }

    #[tokio::test]
    async fn posts_to_and_message_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sms"))
            .and(body_json(json!({ "to": "555-0100", "message": "alice checked in" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WebhookSmsChannel::new(format!("{}/sms", server.uri()));
        channel.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn gateway_error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sms"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WebhookSmsChannel::new(format!("{}/sms", server.uri()));
        assert!(channel.send(&message()).await.is_err());
    }
}
