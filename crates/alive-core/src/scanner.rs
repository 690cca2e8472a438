use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use alive_db::{SharedStore, blocking, format_timestamp};
use alive_types::models::User;

use crate::convert;
use crate::error::CoreResult;

/// Finds users overdue for a check-in.
///
/// By default a user stays "inactive" on every sweep until they check in
/// again, so each sweep re-notifies their contacts. Setting `renotify_after`
/// suppresses users already notified within that window.
#[derive(Clone)]
pub struct InactivityScanner {
    store: SharedStore,
    threshold: Duration,
    renotify_after: Option<Duration>,
}

impl InactivityScanner {
    pub fn new(store: SharedStore, threshold: Duration) -> Self {
        Self {
            store,
            threshold,
            renotify_after: None,
        }
    }

    pub fn with_renotify_after(mut self, window: Option<Duration>) -> Self {
        self.renotify_after = window;
        self
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Users with no check-in at all, or whose last one is older than the threshold.
    pub async fn find_inactive_users(&self, now: DateTime<Utc>) -> CoreResult<Vec<User>> {
        let stale_before = format_timestamp(cutoff(now, self.threshold)?);
        let notified_before = match self.renotify_after {
            Some(window) => Some(format_timestamp(cutoff(now, window)?)),
            None => None,
        };

        let rows = blocking(&self.store, move |s| {
            s.find_inactive_users(&stale_before, notified_before.as_deref())
        })
        .await?;
        Ok(rows.into_iter().map(convert::user).collect())
    }

    /// Stamp the watermark after a user's contacts were told. No-op unless a
    /// re-notify window is configured.
    pub async fn mark_notified(&self, user_id: Uuid, now: DateTime<Utc>) -> CoreResult<()> {
        if self.renotify_after.is_none() {
            return Ok(());
        }
        let (uid, at) = (user_id.to_string(), format_timestamp(now));
        blocking(&self.store, move |s| s.mark_inactive_notified(&uid, &at)).await?;
        Ok(())
    }
}

fn cutoff(now: DateTime<Utc>, window: Duration) -> anyhow::Result<DateTime<Utc>> {
    now.checked_sub_signed(window)
        .ok_or_else(|| anyhow::anyhow!("window of {} hours is out of range", window.num_hours()))
}
