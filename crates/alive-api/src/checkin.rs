use axum::{Extension, Json, extract::State};
use chrono::Utc;
use tracing::warn;

use alive_core::checkin::{compute_stats, daily_checkin};
use alive_types::api::{CheckinRequest, CheckinResponse, Claims, FanoutReport, StatsResponse};

use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::state::AppState;

/// Record today's check-in, then tell every contact about it.
///
/// The check-in is committed before the fanout starts, so a notification
/// failure only shows up in the log and in the returned report.
pub async fn checkin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CheckinRequest>,
) -> ApiResult<Json<CheckinResponse>> {
    let now = Utc::now();
    let checkin = daily_checkin(&state.store, claims.sub, req.status.as_deref(), req.message, now).await?;

    let notified = state
        .fanout
        .notify_checkin(
            claims.sub,
            &claims.username,
            &checkin.status,
            checkin.message.as_deref(),
            now,
        )
        .await
        .unwrap_or_else(|e| {
            warn!(user_id = %claims.sub, error = %e, "Check-in fanout failed");
            FanoutReport::default()
        });

    Ok(Json(CheckinResponse {
        success: true,
        date: checkin.date,
        status: checkin.status,
        message: checkin.message,
        notified,
    }))
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<StatsResponse>> {
    let stats = compute_stats(&state.store, claims.sub, Utc::now().date_naive()).await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
