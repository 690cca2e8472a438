use axum::{Json, extract::State};
use chrono::Utc;

use alive_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<Json<RegisterResponse>> {
    let user = state.accounts.register(req, Utc::now()).await?;
    Ok(Json(RegisterResponse {
        success: true,
        user,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state.accounts.login(req, Utc::now()).await?;
    Ok(Json(LoginResponse {
        success: true,
        token: session.token,
        user: session.user,
    }))
}
