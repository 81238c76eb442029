use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use shared_models::auth::UserRole;

use crate::error::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 100;
pub const MAX_FULL_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of a successful register or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub token: String,
}

/// A `users` row including the password hash. Never serialized to clients.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Trimmed and lower-cased, which is how emails are stored and compared.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
}

impl RegisterRequest {
    /// Returns `(full_name, email)` normalized for storage.
    pub fn validate(&self) -> Result<(String, String), AuthError> {
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() || full_name.chars().count() > MAX_FULL_NAME_LEN {
            return Err(AuthError::Validation(format!(
                "full_name must be 1 to {} characters",
                MAX_FULL_NAME_LEN
            )));
        }

        let email = normalize_email(&self.email);
        let well_formed = email_regex().map_or(false, |re| re.is_match(&email));
        if !well_formed || email.len() > MAX_EMAIL_LEN {
            return Err(AuthError::Validation("A valid email is required".to_string()));
        }

        let password_len = self.password.chars().count();
        if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password_len) {
            return Err(AuthError::Validation(format!(
                "password must be {} to {} characters",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            )));
        }

        Ok((full_name, email))
    }
}
