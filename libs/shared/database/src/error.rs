use thiserror::Error;

/// SQLSTATE raised by PostgreSQL for unique index violations.
pub const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE raised by PostgreSQL for foreign key violations.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum DbError {
    /// The store rejected the write because of a constraint (HTTP 409).
    #[error("Conflict: {message}")]
    Conflict { code: Option<String>, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rejected by the database: {0}")]
    BadRequest(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl DbError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict { .. })
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::Conflict { code, .. }
            if code.as_deref().map_or(true, |c| c == UNIQUE_VIOLATION))
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DbError::Conflict { code: Some(c), .. } if c == FOREIGN_KEY_VIOLATION)
    }
}
