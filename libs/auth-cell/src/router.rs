use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{admin_middleware, auth_middleware};

use crate::handlers;

/// Mounted at `/api/auth`.
pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/validate", post(handlers::validate))
        .with_state(state)
}

/// Mounted at `/api/admin/users`.
pub fn admin_user_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_users))
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
