// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::acting_user_id;

use crate::models::{
    AppointmentFilter, AppointmentPage, AppointmentSearchQuery, AvailabilitySlot,
    AvailableSlotsQuery, BookAppointmentRequest, CancellationOutcome, GenerateSlotsRequest,
    UserAppointmentView,
};
use crate::services::{BookingService, SlotService};

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = acting_user_id(&user)?;

    let booking_service = BookingService::new(&state);
    let confirmation = booking_service.book(user_id, &request).await?;

    Ok(Json(json!({
        "message": "Booked successfully",
        "appointment_id": confirmation.appointment_id
    })))
}

#[axum::debug_handler]
pub async fn my_appointments(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<UserAppointmentView>>, AppError> {
    let user_id = acting_user_id(&user)?;

    let booking_service = BookingService::new(&state);
    let appointments = booking_service.my_appointments(user_id).await?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<i64>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let user_id = acting_user_id(&user)?;

    let booking_service = BookingService::new(&state);
    let message = match booking_service.cancel(user_id, appointment_id).await? {
        CancellationOutcome::Cancelled => "Cancelled",
        CancellationOutcome::AlreadyCancelled => "Already cancelled",
    };

    Ok(Json(json!({ "message": message })))
}

// ==============================================================================
// PUBLIC AVAILABILITY
// ==============================================================================

pub async fn available_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Vec<AvailabilitySlot>>, AppError> {
    let slot_service = SlotService::new(&state);
    let slots = slot_service.available(doctor_id, &query.date).await?;

    Ok(Json(slots))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<GenerateSlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let slot_service = SlotService::new(&state);
    let result = slot_service.generate(&request).await?;

    let message = if result.created == 0 {
        "No new slots created (all already exist)"
    } else {
        "Slots created"
    };

    Ok(Json(json!({
        "message": message,
        "created": result.created,
        "skipped": result.skipped
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<AppConfig>>,
    Path(slot_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let slot_service = SlotService::new(&state);
    slot_service.delete(slot_id).await?;

    Ok(Json(json!({ "message": "Slot deleted" })))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<AppointmentPage>, AppError> {
    let filter = AppointmentFilter::from(query);

    let booking_service = BookingService::new(&state);
    let page = booking_service.search(&filter).await?;

    Ok(Json(page))
}
