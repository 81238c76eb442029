// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::{admin_middleware, auth_middleware};

use crate::handlers;

/// Patient booking routes, mounted at `/api/appointments`.
pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/my", get(handlers::my_appointments))
        .route("/{appointment_id}/cancel", patch(handlers::cancel_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Public availability listing, merged into the doctor routes at `/api/doctors`.
pub fn doctor_slot_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{doctor_id}/slots", get(handlers::available_slots))
        .with_state(state)
}

/// Mounted at `/api/admin/slots`.
pub fn admin_slot_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/bulk", post(handlers::generate_slots))
        .route("/{slot_id}", delete(handlers::delete_slot))
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

/// Mounted at `/api/admin/appointments`.
pub fn admin_appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::search_appointments))
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
