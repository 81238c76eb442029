use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{admin_middleware, auth_middleware};

use crate::handlers;

/// Public doctor directory, mounted at `/api/doctors`.
pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .with_state(state)
}

/// Mounted at `/api/services`.
pub fn service_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_services))
        .with_state(state)
}

/// Mounted at `/api/admin/doctors`.
pub fn admin_doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::admin_list_doctors).post(handlers::create_doctor))
        .route(
            "/{doctor_id}",
            get(handlers::admin_get_doctor)
                .put(handlers::update_doctor)
                .delete(handlers::deactivate_doctor),
        )
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
