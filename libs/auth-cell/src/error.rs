use thiserror::Error;

use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email already exists")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token issuance failed: {0}")]
    Token(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => AppError::BadRequest(err.to_string()),
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::Hashing(_) | AuthError::Token(_) => AppError::Internal(err.to_string()),
            AuthError::Database(db) => AppError::Database(db.to_string()),
        }
    }
}
