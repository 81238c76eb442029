// libs/appointment-cell/src/services/slots.rs
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;

use crate::error::SchedulingError;
use crate::models::{
    parse_date, start_of_day, AvailabilitySlot, GenerateSlotsRequest, GenerateSlotsResult, NewSlot,
};
use crate::services::generator::{generate_slots, SlotWindow};
use crate::store::{PostgrestStore, SchedulingStore};

/// Bulk generation, deletion and listing of a doctor's availability slots.
pub struct SlotService {
    store: Arc<dyn SchedulingStore>,
}

impl SlotService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_store(Arc::new(PostgrestStore::new(config)))
    }

    pub fn with_store(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request), fields(doctor_id = request.doctor_id, date = %request.date))]
    pub async fn generate(
        &self,
        request: &GenerateSlotsRequest,
    ) -> Result<GenerateSlotsResult, SchedulingError> {
        if !self.store.doctor_exists(request.doctor_id, false).await? {
            return Err(SchedulingError::NotFound("Doctor not found".to_string()));
        }

        let window = SlotWindow::parse(
            &request.date,
            &request.start_time,
            &request.end_time,
            request.slot_minutes,
        )?;

        let generated = generate_slots(request.doctor_id, &window);
        if generated.is_empty() {
            return Err(SchedulingError::InvalidArgument(
                "No slots generated. Check time range and slot_minutes.".to_string(),
            ));
        }

        let (day_start, day_end) = window.day_bounds();
        let existing: HashSet<_> = self
            .store
            .slot_start_times(request.doctor_id, day_start, day_end)
            .await?
            .into_iter()
            .collect();

        let total = generated.len();
        let new_slots: Vec<NewSlot> = generated
            .into_iter()
            .filter(|slot| !existing.contains(&slot.start_time))
            .collect();
        let skipped = total - new_slots.len();

        if new_slots.is_empty() {
            debug!("All {} generated slots already exist", total);
            return Ok(GenerateSlotsResult { created: 0, skipped });
        }

        let created = self.store.insert_slots(&new_slots).await.map_err(|e| {
            if e.is_conflict() {
                warn!("Concurrent slot generation rejected by the store: {}", e);
                SchedulingError::Conflict("Some slots already exist (unique constraint).".to_string())
            } else {
                e.into()
            }
        })?;

        info!("Created {} slots ({} already existed)", created, skipped);
        Ok(GenerateSlotsResult { created, skipped })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, slot_id: i64) -> Result<(), SchedulingError> {
        let slot = self
            .store
            .get_slot(slot_id)
            .await?
            .ok_or_else(|| SchedulingError::NotFound("Slot not found".to_string()))?;

        if slot.is_booked {
            return Err(booked_slot());
        }

        let deleted = self.store.delete_unbooked_slot(slot_id).await.map_err(|e| {
            if e.is_foreign_key_violation() {
                SchedulingError::InvalidArgument(
                    "Cannot delete a slot with appointment history".to_string(),
                )
            } else {
                e.into()
            }
        })?;

        if !deleted {
            // Booked or removed between the read and the guarded delete.
            return match self.store.get_slot(slot_id).await? {
                Some(_) => Err(booked_slot()),
                None => Err(SchedulingError::NotFound("Slot not found".to_string())),
            };
        }

        info!("Deleted slot {}", slot_id);
        Ok(())
    }

    /// Unbooked slots of an active doctor on the given `YYYY-MM-DD` day.
    pub async fn available(
        &self,
        doctor_id: i64,
        date: &str,
    ) -> Result<Vec<AvailabilitySlot>, SchedulingError> {
        if !self.store.doctor_exists(doctor_id, true).await? {
            return Err(SchedulingError::NotFound("Doctor not found".to_string()));
        }

        let day = parse_date(date).ok_or_else(|| {
            SchedulingError::InvalidArgument("Invalid date format. Use YYYY-MM-DD".to_string())
        })?;

        let from = start_of_day(day);
        let to = from + chrono::Duration::days(1);

        Ok(self.store.available_slots(doctor_id, from, to).await?)
    }
}

fn booked_slot() -> SchedulingError {
    SchedulingError::InvalidArgument("Cannot delete a booked slot".to_string())
}
