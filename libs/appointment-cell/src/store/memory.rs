// libs/appointment-cell/src/store/memory.rs
//
// In-process store with the same constraints as the SQL schema: unique
// (doctor_id, start_time), at most one booked appointment per slot, and
// restrict-on-delete foreign keys. All operations run under one lock, which
// stands in for the row locks taken by the database functions.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use shared_database::error::{FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use shared_database::DbError;

use crate::models::{
    AdminAppointmentView, Appointment, AppointmentFilter, AppointmentStatus, AvailabilitySlot,
    DoctorSummary, NewSlot, SlotSummary, UserAppointmentView, UserSummary,
};
use crate::store::SchedulingStore;

#[derive(Debug, Clone)]
struct UserRow {
    email: String,
    full_name: String,
}

#[derive(Debug, Clone)]
struct DoctorRow {
    full_name: String,
    clinic_name: Option<String>,
    is_active: bool,
}

#[derive(Default)]
struct Tables {
    users: HashMap<i64, UserRow>,
    doctors: HashMap<i64, DoctorRow>,
    slots: BTreeMap<i64, AvailabilitySlot>,
    appointments: BTreeMap<i64, Appointment>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_active_appointment(&self, slot_id: i64) -> bool {
        self.appointments
            .values()
            .any(|a| a.slot_id == slot_id && a.status.is_active())
    }

    fn doctor_summary(&self, doctor_id: i64) -> Option<DoctorSummary> {
        self.doctors.get(&doctor_id).map(|d| DoctorSummary {
            id: doctor_id,
            full_name: d.full_name.clone(),
            clinic_name: d.clinic_name.clone(),
        })
    }

    fn slot_summary(&self, slot_id: i64) -> Option<SlotSummary> {
        self.slots.get(&slot_id).map(|s| SlotSummary {
            id: Some(s.id),
            start_time: s.start_time,
            end_time: s.end_time,
        })
    }
}

fn conflict(code: &str, message: &str) -> DbError {
    DbError::Conflict {
        code: Some(code.to_string()),
        message: message.to_string(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, email: &str, full_name: &str) -> i64 {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        tables.users.insert(
            id,
            UserRow { email: email.to_lowercase(), full_name: full_name.to_string() },
        );
        id
    }

    pub async fn add_doctor(&self, full_name: &str, clinic_name: Option<&str>, is_active: bool) -> i64 {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        tables.doctors.insert(
            id,
            DoctorRow {
                full_name: full_name.to_string(),
                clinic_name: clinic_name.map(str::to_string),
                is_active,
            },
        );
        id
    }

    /// Inserts one unbooked slot directly, bypassing the generator.
    pub async fn add_slot(
        &self,
        doctor_id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let slot = NewSlot { doctor_id, start_time, end_time, is_booked: false };
        self.insert_slots(std::slice::from_ref(&slot)).await?;

        let tables = self.tables.lock().await;
        Ok(tables
            .slots
            .values()
            .find(|s| s.doctor_id == doctor_id && s.start_time == start_time)
            .map(|s| s.id)
            .unwrap_or_default())
    }

    pub async fn slot(&self, slot_id: i64) -> Option<AvailabilitySlot> {
        self.tables.lock().await.slots.get(&slot_id).cloned()
    }

    pub async fn slots_of(&self, doctor_id: i64) -> Vec<AvailabilitySlot> {
        self.tables
            .lock()
            .await
            .slots
            .values()
            .filter(|s| s.doctor_id == doctor_id)
            .cloned()
            .collect()
    }

    pub async fn appointment(&self, appointment_id: i64) -> Option<Appointment> {
        self.tables.lock().await.appointments.get(&appointment_id).cloned()
    }

    pub async fn active_appointments_for_slot(&self, slot_id: i64) -> usize {
        self.tables
            .lock()
            .await
            .appointments
            .values()
            .filter(|a| a.slot_id == slot_id && a.status.is_active())
            .count()
    }

    pub async fn set_appointment_status(&self, appointment_id: i64, status: AppointmentStatus) {
        if let Some(appointment) = self.tables.lock().await.appointments.get_mut(&appointment_id) {
            appointment.status = status;
        }
    }

    pub async fn set_created_at(&self, appointment_id: i64, created_at: DateTime<Utc>) {
        if let Some(appointment) = self.tables.lock().await.appointments.get_mut(&appointment_id) {
            appointment.created_at = created_at;
        }
    }

    /// Removes a slot without any constraint check, leaving its appointments orphaned.
    pub async fn corrupt_remove_slot(&self, slot_id: i64) {
        self.tables.lock().await.slots.remove(&slot_id);
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn doctor_exists(&self, doctor_id: i64, active_only: bool) -> Result<bool, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .doctors
            .get(&doctor_id)
            .map_or(false, |d| d.is_active || !active_only))
    }

    async fn slot_start_times(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .slots
            .values()
            .filter(|s| s.doctor_id == doctor_id && s.start_time >= from && s.start_time < to)
            .map(|s| s.start_time)
            .collect())
    }

    async fn insert_slots(&self, slots: &[NewSlot]) -> Result<usize, DbError> {
        let mut tables = self.tables.lock().await;

        let mut taken: HashSet<(i64, DateTime<Utc>)> = tables
            .slots
            .values()
            .map(|s| (s.doctor_id, s.start_time))
            .collect();

        for slot in slots {
            if !tables.doctors.contains_key(&slot.doctor_id) {
                return Err(conflict(FOREIGN_KEY_VIOLATION, "doctor does not exist"));
            }
            if !taken.insert((slot.doctor_id, slot.start_time)) {
                return Err(conflict(
                    UNIQUE_VIOLATION,
                    "duplicate key value violates unique constraint \"ux_slots_doctor_start\"",
                ));
            }
        }

        for slot in slots {
            let id = tables.next_id();
            tables.slots.insert(
                id,
                AvailabilitySlot {
                    id,
                    doctor_id: slot.doctor_id,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                    is_booked: slot.is_booked,
                },
            );
        }

        Ok(slots.len())
    }

    async fn get_slot(&self, slot_id: i64) -> Result<Option<AvailabilitySlot>, DbError> {
        Ok(self.tables.lock().await.slots.get(&slot_id).cloned())
    }

    async fn available_slots(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AvailabilitySlot>, DbError> {
        let tables = self.tables.lock().await;
        let mut slots: Vec<AvailabilitySlot> = tables
            .slots
            .values()
            .filter(|s| {
                s.doctor_id == doctor_id && !s.is_booked && s.start_time >= from && s.start_time < to
            })
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.start_time);
        Ok(slots)
    }

    async fn delete_unbooked_slot(&self, slot_id: i64) -> Result<bool, DbError> {
        let mut tables = self.tables.lock().await;

        match tables.slots.get(&slot_id) {
            Some(slot) if !slot.is_booked => {}
            _ => return Ok(false),
        }

        if tables.appointments.values().any(|a| a.slot_id == slot_id) {
            return Err(conflict(
                FOREIGN_KEY_VIOLATION,
                "update or delete on table \"availability_slots\" violates foreign key constraint",
            ));
        }

        tables.slots.remove(&slot_id);
        Ok(true)
    }

    async fn book_slot(
        &self,
        user_id: i64,
        doctor_id: i64,
        slot_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        let mut tables = self.tables.lock().await;

        let slot = tables
            .slots
            .get(&slot_id)
            .cloned()
            .ok_or_else(|| DbError::NotFound("Slot not found".to_string()))?;

        if slot.doctor_id != doctor_id {
            return Err(DbError::BadRequest("Slot does not belong to this doctor".to_string()));
        }
        if slot.start_time <= now {
            return Err(DbError::BadRequest("You cannot book a slot in the past.".to_string()));
        }
        if slot.is_booked || tables.has_active_appointment(slot_id) {
            return Err(conflict(UNIQUE_VIOLATION, "Slot already booked"));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(conflict(
                FOREIGN_KEY_VIOLATION,
                "insert or update on table \"appointments\" violates foreign key constraint",
            ));
        }

        if let Some(slot) = tables.slots.get_mut(&slot_id) {
            slot.is_booked = true;
        }

        let id = tables.next_id();
        tables.appointments.insert(
            id,
            Appointment {
                id,
                user_id,
                doctor_id,
                slot_id,
                status: AppointmentStatus::Booked,
                created_at: now,
                slot: None,
            },
        );

        Ok(id)
    }

    async fn find_user_appointment(
        &self,
        appointment_id: i64,
        user_id: i64,
    ) -> Result<Option<Appointment>, DbError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .appointments
            .get(&appointment_id)
            .filter(|a| a.user_id == user_id)
            .map(|a| Appointment {
                slot: tables.slots.get(&a.slot_id).cloned(),
                ..a.clone()
            }))
    }

    async fn cancel_appointment(&self, appointment_id: i64, user_id: i64) -> Result<bool, DbError> {
        let mut tables = self.tables.lock().await;

        let appointment = tables
            .appointments
            .get(&appointment_id)
            .filter(|a| a.user_id == user_id)
            .cloned()
            .ok_or_else(|| DbError::NotFound("Appointment not found".to_string()))?;

        match appointment.status {
            AppointmentStatus::Cancelled => return Ok(false),
            AppointmentStatus::Completed => {
                return Err(DbError::BadRequest(
                    "Only booked appointments can be cancelled".to_string(),
                ))
            }
            AppointmentStatus::Booked => {}
        }

        if !tables.slots.contains_key(&appointment.slot_id) {
            return Err(DbError::Api { status: 500, message: "Slot data is missing.".to_string() });
        }

        if let Some(a) = tables.appointments.get_mut(&appointment_id) {
            a.status = AppointmentStatus::Cancelled;
        }
        if let Some(slot) = tables.slots.get_mut(&appointment.slot_id) {
            slot.is_booked = false;
        }

        Ok(true)
    }

    async fn user_appointments(&self, user_id: i64) -> Result<Vec<UserAppointmentView>, DbError> {
        let tables = self.tables.lock().await;

        let mut rows: Vec<&Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .map(|a| UserAppointmentView {
                id: a.id,
                status: a.status,
                created_at: a.created_at,
                doctor: tables.doctor_summary(a.doctor_id),
                slot: tables.slot_summary(a.slot_id),
            })
            .collect())
    }

    async fn search_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<(Vec<AdminAppointmentView>, i64), DbError> {
        let tables = self.tables.lock().await;
        let email_needle = filter.user_email.as_deref().map(str::to_lowercase);

        let mut matches: Vec<AdminAppointmentView> = tables
            .appointments
            .values()
            .filter_map(|a| {
                let user = tables.users.get(&a.user_id)?;
                let slot = tables.slots.get(&a.slot_id)?;

                if filter.status.map_or(false, |s| s != a.status) {
                    return None;
                }
                if filter.doctor_id.map_or(false, |d| d != a.doctor_id) {
                    return None;
                }
                if let Some(needle) = email_needle.as_deref() {
                    if !user.email.to_lowercase().contains(needle) {
                        return None;
                    }
                }
                if filter.starts_from.map_or(false, |from| slot.start_time < from) {
                    return None;
                }
                if filter.starts_before.map_or(false, |before| slot.start_time >= before) {
                    return None;
                }

                Some(AdminAppointmentView {
                    id: a.id,
                    status: a.status,
                    created_at: a.created_at,
                    user: Some(UserSummary {
                        id: a.user_id,
                        email: user.email.clone(),
                        full_name: user.full_name.clone(),
                    }),
                    doctor: tables.doctor_summary(a.doctor_id),
                    slot: tables.slot_summary(a.slot_id),
                })
            })
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.page_size as usize)
            .collect();

        Ok((page, total))
    }
}
