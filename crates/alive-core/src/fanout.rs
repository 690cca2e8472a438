use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use alive_db::models::{ContactRow, NewNotification};
use alive_db::{SharedStore, blocking, format_timestamp};
use alive_types::api::FanoutReport;
use alive_types::models::NotificationKind;

use crate::channels::{Channel, OutboundMessage};
use crate::error::CoreResult;
use crate::templates::{RenderedMessage, Renderer};

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Dispatches one user event to every contact of that user.
///
/// Contacts are processed one after another. Each contact is its own failure
/// boundary: a channel error or timeout is logged and counted, and the
/// fanout moves on to the next contact.
pub struct FanoutEngine {
    store: SharedStore,
    email: Arc<dyn Channel>,
    sms: Arc<dyn Channel>,
    renderer: Renderer,
    dispatch_timeout: Duration,
}

impl FanoutEngine {
    pub fn new(
        store: SharedStore,
        email: Arc<dyn Channel>,
        sms: Arc<dyn Channel>,
        renderer: Renderer,
    ) -> Self {
        Self {
            store,
            email,
            sms,
            renderer,
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub async fn notify_checkin(
        &self,
        user_id: Uuid,
        username: &str,
        status: &str,
        message: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<FanoutReport> {
        let rendered = self.renderer.checkin(username, status, message, now)?;
        self.fanout(user_id, NotificationKind::Checkin, &rendered, now).await
    }

    pub async fn notify_inactive(
        &self,
        user_id: Uuid,
        username: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<FanoutReport> {
        let rendered = self.renderer.inactive(username, now)?;
        self.fanout(user_id, NotificationKind::Inactive, &rendered, now).await
    }

    /// Only loading the contact list can fail the whole call.
    async fn fanout(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        rendered: &RenderedMessage,
        now: DateTime<Utc>,
    ) -> CoreResult<FanoutReport> {
        let uid = user_id.to_string();
        let contacts = blocking(&self.store, move |s| s.list_contacts(&uid)).await?;

        let mut report = FanoutReport::default();
        for contact in contacts {
            report.count += 1;
            match self.deliver(user_id, kind, &contact, rendered, now).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        %user_id,
                        contact_id = %contact.id,
                        kind = kind.as_str(),
                        error = %e,
                        "Notification to contact failed"
                    );
                    report.failed += 1;
                }
            }
        }

        debug!(
            %user_id,
            kind = kind.as_str(),
            count = report.count,
            delivered = report.delivered,
            failed = report.failed,
            "Fanout complete"
        );
        Ok(report)
    }

    /// Try every channel the contact has, then append the audit row. The row
    /// is written even when a channel failed: it records the attempt.
    async fn deliver(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        contact: &ContactRow,
        rendered: &RenderedMessage,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut first_failure = None;

        if let Some(email) = &contact.contact_email {
            let message = OutboundMessage {
                target: email.clone(),
                subject: Some(rendered.subject.clone()),
                body: rendered.html.clone(),
            };
            if let Err(e) = self.dispatch(self.email.as_ref(), &message).await {
                first_failure.get_or_insert(e);
            }
        }

        if let Some(phone) = &contact.contact_phone {
            let message = OutboundMessage {
                target: phone.clone(),
                subject: None,
                body: rendered.text.clone(),
            };
            if let Err(e) = self.dispatch(self.sms.as_ref(), &message).await {
                first_failure.get_or_insert(e);
            }
        }

        let row = NewNotification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            contact_id: contact.id.clone(),
            kind: kind.as_str().to_string(),
            content: rendered.text.clone(),
            sent_at: format_timestamp(now),
        };
        blocking(&self.store, move |s| s.insert_notification(&row))
            .await
            .context("record notification")?;

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn dispatch(&self, channel: &dyn Channel, message: &OutboundMessage) -> anyhow::Result<()> {
        match tokio::time::timeout(self.dispatch_timeout, channel.send(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.context(format!("{} to {}", channel.kind(), message.target))),
            Err(_) => Err(anyhow!(
                "{} to {} timed out after {:?}",
                channel.kind(),
                message.target,
                self.dispatch_timeout
            )),
        }
    }
}
