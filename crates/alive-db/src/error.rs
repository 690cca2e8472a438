use rusqlite::ErrorCode;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("unique constraint violated: {detail}")]
    UniqueViolation { detail: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
            let unique = err.code == ErrorCode::ConstraintViolation
                && (err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY);
            if unique {
                return DbError::UniqueViolation {
                    detail: msg.clone().unwrap_or_else(|| err.to_string()),
                };
            }
        }
        DbError::Other(e.into())
    }
}
