//! Notification content. Email bodies are askama templates under
//! `templates/`, HTML-escaped on render; subjects and SMS text are plain.

use askama::Template;
use chrono::{DateTime, FixedOffset, Utc};

use alive_types::status;

/// Content for one event, in both channel shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    /// Email body.
    pub html: String,
    /// SMS body, also stored in the audit log.
    pub text: String,
}

#[derive(Template)]
#[template(path = "checkin.html")]
struct CheckinEmail<'a> {
    emoji: &'a str,
    username: &'a str,
    status: &'a str,
    time: &'a str,
    message: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "inactive.html")]
struct InactiveEmail<'a> {
    username: &'a str,
    hours: i64,
    time: &'a str,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    display_offset: FixedOffset,
    inactive_hours: i64,
}

impl Renderer {
    /// `display_offset` is the zone timestamps are shown in; `inactive_hours`
    /// is quoted in missed check-in alerts.
    pub fn new(display_offset: FixedOffset, inactive_hours: i64) -> Self {
        Self {
            display_offset,
            inactive_hours,
        }
    }

    pub fn checkin(
        &self,
        username: &str,
        status: &str,
        message: Option<&str>,
        at: DateTime<Utc>,
    ) -> anyhow::Result<RenderedMessage> {
        let presentation = status::presentation(status);
        let time = self.display_time(at);
        let message = message.filter(|m| !m.is_empty());

        let html = CheckinEmail {
            emoji: presentation.emoji,
            username,
            status: &presentation.label,
            time: &time,
            message,
        }
        .render()?;

        let message_suffix = message.map(|m| format!(". Message: {m}")).unwrap_or_default();
        Ok(RenderedMessage {
            subject: format!("{username} checked in today"),
            html,
            text: format!(
                "{username} checked in at {time}. Status: {}{message_suffix}",
                presentation.label
            ),
        })
    }

    pub fn inactive(&self, username: &str, at: DateTime<Utc>) -> anyhow::Result<RenderedMessage> {
        let hours = self.inactive_hours;
        let time = self.display_time(at);

        let html = InactiveEmail {
            username,
            hours,
            time: &time,
        }
        .render()?;

        Ok(RenderedMessage {
            subject: format!("⚠️ {username} has not checked in for over {hours} hours"),
            html,
            text: format!(
                "{username} has not checked in for over {hours} hours. Please get in touch and make sure they are safe."
            ),
        })
    }

    fn display_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.display_offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}
