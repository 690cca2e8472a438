use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use alive_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract and validate the bearer token, then hand the claims to the
/// handler through request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| CoreError::auth("missing bearer token"))?;

    let claims = state.accounts.verify_token(token.trim())?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
