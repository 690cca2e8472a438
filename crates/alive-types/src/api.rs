use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Checkin, Contact, Notification};

// -- JWT Claims --

/// Claims carried by every session token. Shared by token issuance
/// (alive-core accounts) and the bearer middleware (alive-api).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: RegisteredUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: SessionUser,
}

// -- Check-ins --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckinRequest {
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Outcome of dispatching one event to all of a user's contacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    /// Contacts processed, whatever the outcome.
    pub count: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct CheckinResponse {
    pub success: bool,
    pub date: NaiveDate,
    pub status: String,
    pub message: Option<String>,
    pub notified: FanoutReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinStats {
    pub has_checked_in_today: bool,
    pub today_checkin: Option<Checkin>,
    pub recent_checkins: Vec<Checkin>,
    pub consecutive_days: u32,
    pub total_checkins: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: CheckinStats,
}

// -- Contacts --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactRequest {
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub contact: Contact,
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub success: bool,
    pub contacts: Vec<Contact>,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub success: bool,
    pub notifications: Vec<Notification>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
