use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::StatusPresentation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub last_checkin: Option<DateTime<Utc>>,
}

/// One day's status report. Unique per (user, date).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub id: Uuid,
    pub date: NaiveDate,
    pub status: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub presentation: StatusPresentation,
}

/// A notification target owned by one user. Has an email, a phone, or both.
#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: Uuid,
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Checkin,
    Inactive,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkin => "checkin",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "checkin" => Some(Self::Checkin),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Audit record of one fanout to one contact. Append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub contact_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    /// `None` once the contact has been deleted.
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
}
