use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error, info};

use alive_core::CoreError;
use alive_types::api::ErrorResponse;

pub type ApiResult<T> = Result<T, ApiError>;

/// A [`CoreError`] on its way out as `{"success": false, "error": ...}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub CoreError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            CoreError::Validation(_) | CoreError::Conflict(_) | CoreError::NotFoundOrForbidden(_) => {
                StatusCode::BAD_REQUEST
            }
            CoreError::Auth(_) => StatusCode::UNAUTHORIZED,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal details stay in the log.
    fn user_message(&self) -> String {
        match &self.0 {
            CoreError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            CoreError::Internal(e) => error!("Internal service error: {:#}", e),
            CoreError::Auth(_) => info!("Authentication error: {}", self),
            _ => debug!("Client error: {}", self),
        }

        let status = self.status_code();
        let body = ErrorResponse {
            success: false,
            error: self.user_message(),
        };
        (status, Json(body)).into_response()
    }
}
