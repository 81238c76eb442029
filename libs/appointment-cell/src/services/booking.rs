// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::DbError;

use crate::error::SchedulingError;
use crate::models::{
    AppointmentFilter, AppointmentPage, AppointmentStatus, BookAppointmentRequest,
    BookingConfirmation, CancellationOutcome, UserAppointmentView,
};
use crate::services::cancellation::CancellationPolicy;
use crate::store::{PostgrestStore, SchedulingStore};

/// Booking engine: owns slot occupancy and the appointment status transitions.
pub struct BookingService {
    store: Arc<dyn SchedulingStore>,
    policy: CancellationPolicy,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_store(
            Arc::new(PostgrestStore::new(config)),
            CancellationPolicy::from_config(config),
        )
    }

    pub fn with_store(store: Arc<dyn SchedulingStore>, policy: CancellationPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn book(
        &self,
        user_id: i64,
        request: &BookAppointmentRequest,
    ) -> Result<BookingConfirmation, SchedulingError> {
        self.book_at(user_id, request, Utc::now()).await
    }

    /// Books `request.slot_id` for `user_id` as of `now`.
    ///
    /// The pre-read gives precise errors for the common cases; the store's
    /// `book_slot` re-checks everything under a row lock and its unique index
    /// on active appointments decides any race.
    #[instrument(skip(self, request), fields(doctor_id = request.doctor_id, slot_id = request.slot_id))]
    pub async fn book_at(
        &self,
        user_id: i64,
        request: &BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingConfirmation, SchedulingError> {
        let slot = self
            .store
            .get_slot(request.slot_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("Slot not found".to_string()))?;

        if slot.doctor_id != request.doctor_id {
            return Err(SchedulingError::InvalidArgument(
                "Slot does not belong to this doctor".to_string(),
            ));
        }

        if slot.start_time <= now {
            return Err(SchedulingError::InvalidArgument(
                "You cannot book a slot in the past.".to_string(),
            ));
        }

        if slot.is_booked {
            return Err(already_booked());
        }

        let appointment_id = self
            .store
            .book_slot(user_id, request.doctor_id, request.slot_id, now)
            .await
            .map_err(classify_booking_error)?;

        info!("User {} booked slot {} (appointment {})", user_id, request.slot_id, appointment_id);
        Ok(BookingConfirmation { appointment_id })
    }

    pub async fn cancel(
        &self,
        user_id: i64,
        appointment_id: i64,
    ) -> Result<CancellationOutcome, SchedulingError> {
        self.cancel_at(user_id, appointment_id, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn cancel_at(
        &self,
        user_id: i64,
        appointment_id: i64,
        now: DateTime<Utc>,
    ) -> Result<CancellationOutcome, SchedulingError> {
        let appointment = self
            .store
            .find_user_appointment(appointment_id, user_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("Appointment not found".to_string()))?;

        match appointment.status {
            AppointmentStatus::Cancelled => {
                debug!("Appointment {} already cancelled", appointment_id);
                return Ok(CancellationOutcome::AlreadyCancelled);
            }
            AppointmentStatus::Completed => {
                return Err(SchedulingError::InvalidArgument(
                    "Completed appointments cannot be cancelled".to_string(),
                ));
            }
            AppointmentStatus::Booked => {}
        }

        let slot = appointment.slot.ok_or_else(|| {
            warn!("Appointment {} references missing slot {}", appointment_id, appointment.slot_id);
            SchedulingError::Internal("Slot data is missing.".to_string())
        })?;

        self.policy.check(slot.start_time, now)?;

        let cancelled = self.store.cancel_appointment(appointment_id, user_id).await?;
        if !cancelled {
            return Ok(CancellationOutcome::AlreadyCancelled);
        }

        info!("User {} cancelled appointment {}", user_id, appointment_id);
        Ok(CancellationOutcome::Cancelled)
    }

    pub async fn my_appointments(&self, user_id: i64) -> Result<Vec<UserAppointmentView>, SchedulingError> {
        Ok(self.store.user_appointments(user_id).await?)
    }

    pub async fn search(&self, filter: &AppointmentFilter) -> Result<AppointmentPage, SchedulingError> {
        let (items, total) = self.store.search_appointments(filter).await?;
        Ok(AppointmentPage::new(filter, total, items))
    }
}

fn already_booked() -> SchedulingError {
    SchedulingError::Conflict("Slot already booked".to_string())
}

fn classify_booking_error(err: DbError) -> SchedulingError {
    if err.is_foreign_key_violation() {
        return SchedulingError::Unauthorized("User not found".to_string());
    }
    if err.is_unique_violation() {
        warn!("Booking lost a race for the slot: {}", err);
        return already_booked();
    }
    err.into()
}
