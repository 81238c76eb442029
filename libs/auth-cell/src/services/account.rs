use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{DbError, SupabaseClient};
use shared_models::auth::UserRole;
use shared_utils::jwt::issue_token;

use crate::error::AuthError;
use crate::models::{normalize_email, AuthResponse, LoginRequest, RegisterRequest, UserRecord, UserSummary};
use crate::services::password::{hash_password, verify_password};

const USER_COLUMNS: &str = "id,full_name,email,password_hash,role,created_at";
const SUMMARY_COLUMNS: &str = "id,full_name,email,role,created_at";

pub struct AccountService {
    supabase: SupabaseClient,
    config: AppConfig,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            config: config.clone(),
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, AuthError> {
        let (full_name, email) = request.validate()?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = self
            .create_user(&full_name, &email, &request.password, UserRole::User)
            .await?;

        info!("Registered user {}", user.id);
        self.respond(user)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&request.email);

        let Some(user) = self.find_by_email(&email).await? else {
            debug!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&request.password, &user.password_hash)? {
            warn!("Wrong password for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        self.respond(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let path = format!(
            "/rest/v1/users?email=eq.{}&select={}",
            urlencoding::encode(email),
            USER_COLUMNS
        );
        let users: Vec<UserRecord> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(users.into_iter().next())
    }

    pub async fn admin_exists(&self) -> Result<bool, AuthError> {
        let path = "/rest/v1/users?role=eq.admin&select=id&limit=1";
        let admins: Vec<serde_json::Value> = self.supabase.request(Method::GET, path, None, None).await?;
        Ok(!admins.is_empty())
    }

    /// Newest accounts first.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AuthError> {
        let path = format!("/rest/v1/users?select={}&order=created_at.desc", SUMMARY_COLUMNS);
        let users: Vec<UserSummary> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(users)
    }

    /// Inserts a user with a freshly hashed password. The email must already be normalized.
    pub async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<UserRecord, AuthError> {
        let password_hash = hash_password(password)?;

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let path = format!("/rest/v1/users?select={}", USER_COLUMNS);
        let body = json!({
            "full_name": full_name,
            "email": email,
            "password_hash": password_hash,
            "role": role.as_str()
        });

        let created: Vec<UserRecord> = self
            .supabase
            .request_with_headers(Method::POST, &path, None, Some(body), Some(headers))
            .await
            .map_err(|e| {
                // Two registrations racing for one email.
                if e.is_unique_violation() {
                    AuthError::EmailTaken
                } else {
                    AuthError::Database(e)
                }
            })?;

        created.into_iter().next().ok_or_else(|| {
            AuthError::Database(DbError::Api {
                status: 500,
                message: "Insert returned no user".to_string(),
            })
        })
    }

    fn respond(&self, user: UserRecord) -> Result<AuthResponse, AuthError> {
        let token = issue_token(user.id, &user.email, user.role, &self.config).map_err(AuthError::Token)?;

        Ok(AuthResponse {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            token,
        })
    }
}
