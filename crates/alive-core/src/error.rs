use alive_db::DbError;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The write would duplicate something that must be unique.
    #[error("{0}")]
    Conflict(String),

    /// Missing, or owned by someone else. Deliberately indistinguishable.
    #[error("{0}")]
    NotFoundOrForbidden(String),

    /// Bad credentials, or a missing, invalid or expired token.
    #[error("{0}")]
    Auth(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }
}

impl From<DbError> for CoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Other(inner) => CoreError::Internal(inner),
            unique @ DbError::UniqueViolation { .. } => CoreError::Internal(unique.into()),
        }
    }
}
