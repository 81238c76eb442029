use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{Doctor, DoctorListQuery, Service, UpsertDoctorRequest};
use crate::services::{CatalogService, DoctorService};

// ==============================================================================
// PUBLIC HANDLERS (NO AUTHENTICATION REQUIRED)
// ==============================================================================

pub async fn list_services(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let catalog = CatalogService::new(&state);
    Ok(Json(catalog.list_services().await?))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    let catalog = CatalogService::new(&state);
    Ok(Json(catalog.list_active_doctors(&query).await?))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Doctor>, AppError> {
    let catalog = CatalogService::new(&state);
    Ok(Json(catalog.get_active_doctor(doctor_id).await?))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

pub async fn admin_list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    let doctor_service = DoctorService::new(&state);
    Ok(Json(doctor_service.list_doctors().await?))
}

#[axum::debug_handler]
pub async fn admin_get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Doctor>, AppError> {
    let doctor_service = DoctorService::new(&state);
    Ok(Json(doctor_service.get_doctor(doctor_id).await?))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<UpsertDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor_service = DoctorService::new(&state);
    let id = doctor_service.create_doctor(&request).await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<UpsertDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);
    doctor_service.update_doctor(doctor_id, &request).await?;

    Ok(Json(json!({ "message": "Updated" })))
}

#[axum::debug_handler]
pub async fn deactivate_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);
    doctor_service.deactivate_doctor(doctor_id).await?;

    Ok(Json(json!({ "message": "Doctor deactivated (is_active=false)" })))
}
