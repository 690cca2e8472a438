use std::sync::Arc;

use anyhow::anyhow;

use crate::models::{
    CheckinRow, ContactFields, ContactRow, NewCheckin, NewNotification, NewUser, NotificationRow,
    UserRow,
};
use crate::{DbError, DbResult};

/// Storage operations the check-in core depends on.
///
/// Every mutation on a contact carries the owning `user_id`; implementations
/// must match on both ids so a foreign contact looks exactly like a missing one.
pub trait RecordStore: Send + Sync {
    // -- Users --

    fn create_user(&self, user: &NewUser) -> DbResult<()>;
    fn get_user_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;
    fn get_user_by_id(&self, id: &str) -> DbResult<Option<UserRow>>;

    /// Users with no check-in, or whose last one is older than `stale_before`.
    /// With `notified_before`, users stamped as notified at or after it are skipped.
    fn find_inactive_users(
        &self,
        stale_before: &str,
        notified_before: Option<&str>,
    ) -> DbResult<Vec<UserRow>>;
    fn mark_inactive_notified(&self, user_id: &str, at: &str) -> DbResult<()>;

    // -- Check-ins --

    /// Inserts the check-in and refreshes `users.last_checkin` atomically.
    /// A second check-in for the same (user, date) fails with `UniqueViolation`.
    fn record_checkin(&self, checkin: &NewCheckin) -> DbResult<()>;
    fn get_checkin_on(&self, user_id: &str, date: &str) -> DbResult<Option<CheckinRow>>;
    /// Newest first.
    fn recent_checkins(&self, user_id: &str, limit: u32) -> DbResult<Vec<CheckinRow>>;
    /// Every check-in date for the user, newest first.
    fn checkin_dates(&self, user_id: &str) -> DbResult<Vec<String>>;
    fn count_checkins(&self, user_id: &str) -> DbResult<u64>;

    // -- Contacts --

    fn insert_contact(&self, id: &str, user_id: &str, fields: &ContactFields, created_at: &str)
    -> DbResult<()>;
    /// Id of an existing contact of this user sharing the email or the phone.
    fn find_duplicate_contact(
        &self,
        user_id: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> DbResult<Option<String>>;
    fn get_contact(&self, user_id: &str, contact_id: &str) -> DbResult<Option<ContactRow>>;
    /// Newest first.
    fn list_contacts(&self, user_id: &str) -> DbResult<Vec<ContactRow>>;
    /// Returns the number of rows changed (0 when missing or not owned).
    fn update_contact(&self, user_id: &str, contact_id: &str, fields: &ContactFields)
    -> DbResult<usize>;
    /// Returns the number of rows removed (0 when missing or not owned).
    fn delete_contact(&self, user_id: &str, contact_id: &str) -> DbResult<usize>;

    // -- Notifications --

    fn insert_notification(&self, notification: &NewNotification) -> DbResult<()>;
    /// Newest first.
    fn notification_history(&self, user_id: &str, limit: u32) -> DbResult<Vec<NotificationRow>>;
}

pub type SharedStore = Arc<dyn RecordStore>;

/// Run a store call off the async runtime.
pub async fn blocking<T, F>(store: &SharedStore, f: F) -> DbResult<T>
where
    F: FnOnce(&dyn RecordStore) -> DbResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| DbError::Other(anyhow!("spawn_blocking join error: {}", e)))?
}
