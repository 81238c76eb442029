use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use appointment_cell::router::{
    admin_appointment_routes, admin_slot_routes, appointment_routes, doctor_slot_routes,
};
use auth_cell::router::{admin_user_routes, auth_routes};
use doctor_cell::router::{admin_doctor_routes, doctor_routes, service_routes};
use shared_config::AppConfig;
use shared_utils::extractor::{admin_middleware, auth_middleware};

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/services", service_routes(state.clone()))
        .nest(
            "/doctors",
            doctor_routes(state.clone()).merge(doctor_slot_routes(state.clone())),
        )
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/admin", admin_routes(state));

    Router::new()
        .route("/", get(|| async { "Clinic booking API is running" }))
        .nest("/api", api)
}

fn admin_routes(state: Arc<AppConfig>) -> Router {
    let health = Router::new()
        .route("/", get(admin_health))
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/health", health)
        .nest("/users", admin_user_routes(state.clone()))
        .nest("/doctors", admin_doctor_routes(state.clone()))
        .nest("/slots", admin_slot_routes(state.clone()))
        .nest("/appointments", admin_appointment_routes(state))
}

async fn admin_health() -> Json<Value> {
    Json(json!({ "message": "Admin access granted", "time": Utc::now() }))
}
