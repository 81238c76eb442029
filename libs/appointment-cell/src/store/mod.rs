// libs/appointment-cell/src/store/mod.rs
//
// Persistence seam of the scheduling core. Every method is a single store
// round trip; the multi-row invariants (one slot per doctor and start time,
// one active appointment per slot, no orphaned history) are enforced by the
// store itself and surface as `DbError::Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shared_database::DbError;

use crate::models::{
    AdminAppointmentView, Appointment, AppointmentFilter, AvailabilitySlot, NewSlot,
    UserAppointmentView,
};

pub mod memory;
pub mod postgrest;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;

#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn doctor_exists(&self, doctor_id: i64, active_only: bool) -> Result<bool, DbError>;

    /// Start times of the doctor's slots in `[from, to)`.
    async fn slot_start_times(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, DbError>;

    /// All-or-nothing insert. Returns the number of rows written.
    async fn insert_slots(&self, slots: &[NewSlot]) -> Result<usize, DbError>;

    async fn get_slot(&self, slot_id: i64) -> Result<Option<AvailabilitySlot>, DbError>;

    /// Unbooked slots of the doctor starting in `[from, to)`, ordered by start.
    async fn available_slots(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AvailabilitySlot>, DbError>;

    /// Deletes the slot only while it is unbooked. `false` when nothing matched.
    async fn delete_unbooked_slot(&self, slot_id: i64) -> Result<bool, DbError>;

    /// Atomically flips the slot to booked and records the appointment.
    async fn book_slot(
        &self,
        user_id: i64,
        doctor_id: i64,
        slot_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, DbError>;

    /// The appointment with its slot, only if it belongs to `user_id`.
    async fn find_user_appointment(
        &self,
        appointment_id: i64,
        user_id: i64,
    ) -> Result<Option<Appointment>, DbError>;

    /// Atomically cancels the appointment and frees its slot.
    /// `false` when it was already cancelled.
    async fn cancel_appointment(&self, appointment_id: i64, user_id: i64) -> Result<bool, DbError>;

    /// The user's appointments, newest first.
    async fn user_appointments(&self, user_id: i64) -> Result<Vec<UserAppointmentView>, DbError>;

    /// One page of appointments matching the filter and the total match count.
    async fn search_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<(Vec<AdminAppointmentView>, i64), DbError>;
}
