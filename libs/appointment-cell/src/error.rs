use thiserror::Error;

use shared_database::DbError;
use shared_models::error::AppError;

/// Outcome kinds of the scheduling core. Every variant carries a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Data integrity or store failure that the caller cannot fix.
    #[error("{0}")]
    Internal(String),
}

impl SchedulingError {
    pub fn kind(&self) -> &'static str {
        match self {
            SchedulingError::NotFound(_) => "not_found",
            SchedulingError::InvalidArgument(_) => "invalid_argument",
            SchedulingError::Conflict(_) => "conflict",
            SchedulingError::Unauthorized(_) => "unauthorized",
            SchedulingError::Internal(_) => "internal",
        }
    }
}

impl From<DbError> for SchedulingError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict { message, .. } => SchedulingError::Conflict(message),
            DbError::NotFound(message) => SchedulingError::NotFound(message),
            DbError::BadRequest(message) => SchedulingError::InvalidArgument(message),
            other => SchedulingError::Internal(other.to_string()),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::NotFound(msg) => AppError::NotFound(msg),
            SchedulingError::InvalidArgument(msg) => AppError::BadRequest(msg),
            SchedulingError::Conflict(msg) => AppError::Conflict(msg),
            SchedulingError::Unauthorized(msg) => AppError::Auth(msg),
            SchedulingError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
