use axum::{Extension, Json, extract::State};

use alive_core::history::{DEFAULT_HISTORY_LIMIT, notification_history};
use alive_types::api::{Claims, NotificationListResponse};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<NotificationListResponse>> {
    let notifications = notification_history(&state.store, claims.sub, DEFAULT_HISTORY_LIMIT).await?;
    Ok(Json(NotificationListResponse {
        success: true,
        notifications,
    }))
}
