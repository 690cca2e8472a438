use alive_db::models::{CheckinRow, ContactRow, NotificationRow, UserRow};
use alive_db::{parse_date, parse_timestamp};
use alive_types::models::{Checkin, Contact, Notification, NotificationKind, User};
use alive_types::status;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

pub(crate) fn uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub(crate) fn timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| {
        warn!("Corrupt {} '{}'", what, raw);
        DateTime::default()
    })
}

pub(crate) fn user(row: UserRow) -> User {
    User {
        id: uuid(&row.id, "user id"),
        last_checkin: row.last_checkin.as_deref().map(|t| timestamp(t, "last_checkin")),
        email: row.email,
        username: row.username,
        phone: row.phone,
    }
}

pub(crate) fn checkin(row: CheckinRow) -> Checkin {
    Checkin {
        id: uuid(&row.id, "checkin id"),
        date: parse_date(&row.checkin_date).unwrap_or_else(|| {
            warn!("Corrupt checkin_date '{}' on checkin '{}'", row.checkin_date, row.id);
            Default::default()
        }),
        presentation: status::presentation(&row.status),
        created_at: timestamp(&row.created_at, "checkin created_at"),
        status: row.status,
        message: row.message,
    }
}

pub(crate) fn contact(row: ContactRow) -> Contact {
    Contact {
        id: uuid(&row.id, "contact id"),
        created_at: timestamp(&row.created_at, "contact created_at"),
        contact_name: row.contact_name,
        contact_email: row.contact_email,
        contact_phone: row.contact_phone,
    }
}

pub(crate) fn notification(row: NotificationRow) -> Notification {
    Notification {
        id: uuid(&row.id, "notification id"),
        contact_id: uuid(&row.contact_id, "notification contact_id"),
        kind: NotificationKind::parse(&row.kind).unwrap_or_else(|| {
            warn!("Unknown notification type '{}' on '{}'", row.kind, row.id);
            NotificationKind::Checkin
        }),
        sent_at: timestamp(&row.sent_at, "notification sent_at"),
        content: row.content,
        contact_name: row.contact_name,
        contact_email: row.contact_email,
    }
}
