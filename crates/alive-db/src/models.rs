//! Database row types — these map directly to SQLite rows.
//! Distinct from alive-types API models to keep the DB layer independent.
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub username: String,
    pub created_at: String,
    pub last_checkin: Option<String>,
    pub inactive_notified_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckinRow {
    pub id: String,
    pub user_id: String,
    pub checkin_date: String,
    pub status: String,
    pub message: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ContactRow {
    pub id: String,
    pub user_id: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_name: String,
    pub created_at: String,
}

/// Notification joined with its contact; the contact columns are `None`
/// when the contact no longer exists.
#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub contact_id: String,
    pub kind: String,
    pub content: String,
    pub sent_at: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
}

// -- Inserts --

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewCheckin {
    pub id: String,
    pub user_id: String,
    pub checkin_date: String,
    pub status: String,
    pub message: Option<String>,
    pub created_at: String,
}

/// Mutable contact fields, shared by insert and update.
#[derive(Debug, Clone)]
pub struct ContactFields {
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_name: String,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub id: String,
    pub user_id: String,
    pub contact_id: String,
    pub kind: String,
    pub content: String,
    pub sent_at: String,
}
