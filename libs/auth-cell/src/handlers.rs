use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::typed_header::TypedHeaderRejection;
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserSummary};
use crate::services::AccountService;

pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let accounts = AccountService::new(&state);
    Ok(Json(accounts.register(&request).await?))
}

pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let accounts = AccountService::new(&state);
    Ok(Json(accounts.login(&request).await?))
}

/// Reports the identity carried by the bearer token.
pub async fn validate(
    State(state): State<Arc<AppConfig>>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|e| {
        debug!("Rejected authorization header: {}", e);
        AppError::Auth("Missing or malformed authorization header".to_string())
    })?;

    let user = validate_token(bearer.token(), &state).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let accounts = AccountService::new(&state);
    Ok(Json(accounts.list_users().await?))
}
