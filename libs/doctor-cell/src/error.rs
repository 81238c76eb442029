use thiserror::Error;

use shared_database::DbError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Invalid ServiceId")]
    InvalidServiceId,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::InvalidServiceId => AppError::BadRequest(err.to_string()),
            DoctorError::Validation(msg) => AppError::ValidationError(msg),
            DoctorError::Database(db) => AppError::Database(db.to_string()),
        }
    }
}
