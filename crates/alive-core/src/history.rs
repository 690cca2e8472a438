use uuid::Uuid;

use alive_db::{SharedStore, blocking};
use alive_types::models::Notification;

use crate::convert;
use crate::error::CoreResult;

pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Latest notifications sent on a user's behalf, newest first.
pub async fn notification_history(
    store: &SharedStore,
    user_id: Uuid,
    limit: u32,
) -> CoreResult<Vec<Notification>> {
    let uid = user_id.to_string();
    let rows = blocking(store, move |s| s.notification_history(&uid, limit)).await?;
    Ok(rows.into_iter().map(convert::notification).collect())
}
