use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

/// Validates the bearer token and stores the resolved [`User`] in the request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Capability check for administrative routes. Must be layered inside [`auth_middleware`].
pub async fn admin_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = extract_user(&request)?;

    if !user.is_admin() {
        tracing::warn!("User {} attempted an admin operation", user.id);
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    Ok(next.run(request).await)
}

/// The [`User`] placed in the extensions by [`auth_middleware`].
pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

/// Numeric id of the acting user; a token whose subject is not numeric is rejected.
pub fn acting_user_id(user: &User) -> Result<i64, AppError> {
    user.user_id()
        .ok_or_else(|| AppError::Auth("Invalid token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::test_utils::{JwtTestUtils, TestConfig, TestUser};

    fn app(config: Arc<AppConfig>) -> Router {
        Router::new()
            .route("/admin", get(|| async { "ok" }))
            .layer(middleware::from_fn(admin_middleware))
            .layer(middleware::from_fn_with_state(config, auth_middleware))
    }

    fn request_with(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/admin");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let config = TestConfig::default();
        let response = app(config.to_arc()).oneshot(request_with(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let config = TestConfig::default();
        let user = TestUser::patient("p@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

        let response = app(config.to_arc()).oneshot(request_with(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_passes_through() {
        let config = TestConfig::default();
        let user = TestUser::admin("admin@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

        let response = app(config.to_arc()).oneshot(request_with(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_layer_is_served_from_a_spawned_task() {
        let config = TestConfig::default();
        let user = TestUser::admin("admin@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
        let router = app(config.to_arc());

        let status = tokio::spawn(async move {
            router.oneshot(request_with(Some(&token))).await.unwrap().status()
        })
        .await
        .unwrap();

        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn extract_user_without_auth_layer_is_unauthorized() {
        let request = request_with(None);
        assert!(matches!(extract_user(&request), Err(AppError::Auth(_))));
    }

    #[test]
    fn acting_user_id_requires_numeric_subject() {
        let mut user = TestUser::patient("p@example.com").to_user();
        assert!(acting_user_id(&user).is_ok());

        user.id = "not-a-number".to_string();
        assert!(matches!(acting_user_id(&user), Err(AppError::Auth(_))));
    }
}
