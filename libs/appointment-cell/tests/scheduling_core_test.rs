use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::join_all;

use appointment_cell::models::{
    AppointmentFilter, AppointmentSearchQuery, AppointmentStatus, BookAppointmentRequest,
    CancellationOutcome, GenerateSlotsRequest,
};
use appointment_cell::{BookingService, CancellationPolicy, MemoryStore, SchedulingError, SlotService};

struct Clinic {
    store: Arc<MemoryStore>,
    slots: SlotService,
    booking: BookingService,
    doctor_id: i64,
    patient_id: i64,
}

async fn clinic() -> Clinic {
    let store = Arc::new(MemoryStore::new());
    let doctor_id = store.add_doctor("Dr. Lina Ahmad", Some("Smile Clinic"), true).await;
    let patient_id = store.add_user("patient@example.com", "Test Patient").await;

    Clinic {
        slots: SlotService::with_store(store.clone()),
        booking: BookingService::with_store(store.clone(), CancellationPolicy::default()),
        store,
        doctor_id,
        patient_id,
    }
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, day, hour, minute, 0).unwrap()
}

fn generate_request(doctor_id: i64, start: &str, end: &str, minutes: i64) -> GenerateSlotsRequest {
    GenerateSlotsRequest {
        doctor_id,
        date: "2026-02-22".to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        slot_minutes: minutes,
    }
}

async fn first_slot(clinic: &Clinic) -> i64 {
    clinic
        .slots
        .generate(&generate_request(clinic.doctor_id, "09:00", "10:00", 30))
        .await
        .unwrap();
    let mut slots = clinic.store.slots_of(clinic.doctor_id).await;
    slots.sort_by_key(|s| s.start_time);
    slots[0].id
}

fn book_request(clinic: &Clinic, slot_id: i64) -> BookAppointmentRequest {
    BookAppointmentRequest { doctor_id: clinic.doctor_id, slot_id }
}

// ==============================================================================
// SLOT GENERATION
// ==============================================================================

#[tokio::test]
async fn generating_then_booking_then_regenerating_creates_nothing_new() {
    let clinic = clinic().await;
    let request = generate_request(clinic.doctor_id, "09:00", "10:00", 30);

    let result = clinic.slots.generate(&request).await.unwrap();
    assert_eq!(result.created, 2);
    assert_eq!(result.skipped, 0);

    let slots = clinic.store.slots_of(clinic.doctor_id).await;
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].start_time, at(22, 9, 0));
    assert_eq!(slots[0].end_time, at(22, 9, 30));
    assert_eq!(slots[1].start_time, at(22, 9, 30));
    assert_eq!(slots[1].end_time, at(22, 10, 0));

    clinic
        .booking
        .book_at(clinic.patient_id, &book_request(&clinic, slots[0].id), at(21, 12, 0))
        .await
        .unwrap();

    let again = clinic.slots.generate(&request).await.unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(again.skipped, 2);
    assert_eq!(clinic.store.slots_of(clinic.doctor_id).await.len(), 2);
    assert!(clinic.store.slot(slots[0].id).await.unwrap().is_booked);
}

#[tokio::test]
async fn overlapping_generation_only_adds_unseen_start_times() {
    let clinic = clinic().await;
    clinic
        .slots
        .generate(&generate_request(clinic.doctor_id, "09:00", "10:00", 30))
        .await
        .unwrap();

    let result = clinic
        .slots
        .generate(&generate_request(clinic.doctor_id, "09:00", "11:00", 30))
        .await
        .unwrap();

    assert_eq!(result.created, 2);
    assert_eq!(result.skipped, 2);
    assert_eq!(clinic.store.slots_of(clinic.doctor_id).await.len(), 4);
}

#[tokio::test]
async fn generation_for_unknown_doctor_is_not_found() {
    let clinic = clinic().await;
    let err = clinic
        .slots
        .generate(&generate_request(9999, "09:00", "10:00", 30))
        .await
        .unwrap_err();

    assert_eq!(err, SchedulingError::NotFound("Doctor not found".to_string()));
}

#[tokio::test]
async fn generation_that_fits_no_slot_is_rejected() {
    let clinic = clinic().await;
    let err = clinic
        .slots
        .generate(&generate_request(clinic.doctor_id, "09:00", "09:20", 30))
        .await
        .unwrap_err();

    assert_matches!(err, SchedulingError::InvalidArgument(msg) if msg.starts_with("No slots generated"));
    assert!(clinic.store.slots_of(clinic.doctor_id).await.is_empty());
}

#[tokio::test]
async fn inactive_doctors_can_still_receive_slots() {
    let clinic = clinic().await;
    let retired = clinic.store.add_doctor("Dr. Retired", None, false).await;

    let result = clinic
        .slots
        .generate(&generate_request(retired, "09:00", "10:00", 20))
        .await
        .unwrap();
    assert_eq!(result.created, 3);
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bookings_of_one_slot_have_exactly_one_winner() {
    let clinic = clinic().await;
    let slot_id = first_slot(&clinic).await;

    let mut users = Vec::new();
    for i in 0..8 {
        users.push(clinic.store.add_user(&format!("racer{}@example.com", i), "Racer").await);
    }

    let booking = Arc::new(BookingService::with_store(clinic.store.clone(), CancellationPolicy::default()));
    let request = book_request(&clinic, slot_id);

    let attempts = users.into_iter().map(|user_id| {
        let booking = booking.clone();
        let request = request.clone();
        tokio::spawn(async move { booking.book_at(user_id, &request, at(21, 12, 0)).await })
    });

    let results: Vec<_> = join_all(attempts).await.into_iter().map(|r| r.unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert_eq!(
            result.as_ref().unwrap_err(),
            &SchedulingError::Conflict("Slot already booked".to_string())
        );
    }

    assert_eq!(clinic.store.active_appointments_for_slot(slot_id).await, 1);
    assert!(clinic.store.slot(slot_id).await.unwrap().is_booked);
}

#[tokio::test]
async fn booking_is_stamped_with_the_booking_clock() {
    let clinic = clinic().await;
    let slot_id = first_slot(&clinic).await;

    let confirmation = clinic
        .booking
        .book_at(clinic.patient_id, &book_request(&clinic, slot_id), at(21, 12, 0))
        .await
        .unwrap();

    let appointment = clinic.store.appointment(confirmation.appointment_id).await.unwrap();
    assert_eq!(appointment.created_at, at(21, 12, 0));
}

#[tokio::test]
async fn booked_slot_is_a_conflict() {
    let clinic = clinic().await;
    let slot_id = first_slot(&clinic).await;
    let other = clinic.store.add_user("other@example.com", "Other").await;

    clinic
        .booking
        .book_at(clinic.patient_id, &book_request(&clinic, slot_id), at(21, 12, 0))
        .await
        .unwrap();

    let err = clinic
        .booking
        .book_at(other, &book_request(&clinic, slot_id), at(21, 12, 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "conflict");
}

#[tokio::test]
async fn past_slots_are_rejected_even_when_booked() {
    let clinic = clinic().await;
    let slot_id = first_slot(&clinic).await;

    let err = clinic
        .booking
        .book_at(clinic.patient_id, &book_request(&clinic, slot_id), at(22, 9, 0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SchedulingError::InvalidArgument("You cannot book a slot in the past.".to_string())
    );

    clinic
        .booking
        .book_at(clinic.patient_id, &book_request(&clinic, slot_id), at(21, 12, 0))
        .await
        .unwrap();

    let err = clinic
        .booking
        .book_at(clinic.patient_id, &book_request(&clinic, slot_id), at(23, 8, 0))
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::InvalidArgument(_));
}

#[tokio::test]
async fn slot_must_exist_and_belong_to_the_doctor() {
    let clinic = clinic().await;
    let slot_id = first_slot(&clinic).await;
    let other_doctor = clinic.store.add_doctor("Dr. Omar Saleh", None, true).await;

    let err = clinic
        .booking
        .book_at(
            clinic.patient_id,
            &BookAppointmentRequest { doctor_id: other_doctor, slot_id },
            at(21, 12, 0),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SchedulingError::InvalidArgument("Slot does not belong to this doctor".to_string())
    );

    let err = clinic
        .booking
        .book_at(clinic.patient_id, &book_request(&clinic, 424242), at(21, 12, 0))
        .await
        .unwrap_err();
    assert_eq!(err, SchedulingError::NotFound("Slot not found".to_string()));
}

#[tokio::test]
async fn unknown_acting_user_is_unauthorized_and_slot_stays_free() {
    let clinic = clinic().await;
    let slot_id = first_slot(&clinic).await;

    let err = clinic
        .booking
        .book_at(777_777, &book_request(&clinic, slot_id), at(21, 12, 0))
        .await
        .unwrap_err();

    assert_matches!(err, SchedulingError::Unauthorized(_));
    assert!(!clinic.store.slot(slot_id).await.unwrap().is_booked);
    assert_eq!(clinic.store.active_appointments_for_slot(slot_id).await, 0);
}

// ==============================================================================
// CANCELLATION
// ==============================================================================

async fn booked(clinic: &Clinic) -> (i64, i64) {
    let slot_id = first_slot(clinic).await;
    let confirmation = clinic
        .booking
        .book_at(clinic.patient_id, &book_request(clinic, slot_id), at(20, 8, 0))
        .await
        .unwrap();
    (slot_id, confirmation.appointment_id)
}

#[tokio::test]
async fn cancelling_with_exactly_sixty_minutes_left_is_refused() {
    let clinic = clinic().await;
    let (slot_id, appointment_id) = booked(&clinic).await;

    let err = clinic
        .booking
        .cancel_at(clinic.patient_id, appointment_id, at(22, 8, 0))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SchedulingError::InvalidArgument(
            "Cancellation is not allowed within 1 hour of the appointment.".to_string()
        )
    );
    assert_eq!(clinic.store.appointment(appointment_id).await.unwrap().status, AppointmentStatus::Booked);
    assert!(clinic.store.slot(slot_id).await.unwrap().is_booked);
}

#[tokio::test]
async fn cancelling_with_sixty_one_minutes_left_frees_the_slot() {
    let clinic = clinic().await;
    let (slot_id, appointment_id) = booked(&clinic).await;

    let outcome = clinic
        .booking
        .cancel_at(clinic.patient_id, appointment_id, at(22, 7, 59))
        .await
        .unwrap();

    assert_eq!(outcome, CancellationOutcome::Cancelled);
    assert_eq!(clinic.store.appointment(appointment_id).await.unwrap().status, AppointmentStatus::Cancelled);
    assert!(!clinic.store.slot(slot_id).await.unwrap().is_booked);
    assert_eq!(clinic.store.active_appointments_for_slot(slot_id).await, 0);
}

#[tokio::test]
async fn freed_slot_can_be_booked_again() {
    let clinic = clinic().await;
    let (slot_id, appointment_id) = booked(&clinic).await;
    let other = clinic.store.add_user("second@example.com", "Second").await;

    clinic
        .booking
        .cancel_at(clinic.patient_id, appointment_id, at(21, 9, 0))
        .await
        .unwrap();

    let rebooked = clinic
        .booking
        .book_at(other, &book_request(&clinic, slot_id), at(21, 10, 0))
        .await
        .unwrap();

    assert_ne!(rebooked.appointment_id, appointment_id);
    assert_eq!(clinic.store.active_appointments_for_slot(slot_id).await, 1);
}

#[tokio::test]
async fn cancelling_twice_is_idempotent() {
    let clinic = clinic().await;
    let (slot_id, appointment_id) = booked(&clinic).await;

    clinic
        .booking
        .cancel_at(clinic.patient_id, appointment_id, at(21, 9, 0))
        .await
        .unwrap();
    let before = clinic.store.appointment(appointment_id).await.unwrap();

    // Someone else takes the freed slot in between.
    let other = clinic.store.add_user("later@example.com", "Later").await;
    clinic
        .booking
        .book_at(other, &book_request(&clinic, slot_id), at(21, 10, 0))
        .await
        .unwrap();

    let outcome = clinic
        .booking
        .cancel_at(clinic.patient_id, appointment_id, at(22, 8, 59))
        .await
        .unwrap();
    assert_eq!(outcome, CancellationOutcome::AlreadyCancelled);

    let after = clinic.store.appointment(appointment_id).await.unwrap();
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.status, AppointmentStatus::Cancelled);
    assert!(clinic.store.slot(slot_id).await.unwrap().is_booked);
}

#[tokio::test]
async fn only_the_owner_can_cancel() {
    let clinic = clinic().await;
    let (_, appointment_id) = booked(&clinic).await;
    let stranger = clinic.store.add_user("stranger@example.com", "Stranger").await;

    let err = clinic
        .booking
        .cancel_at(stranger, appointment_id, at(21, 9, 0))
        .await
        .unwrap_err();
    assert_eq!(err, SchedulingError::NotFound("Appointment not found".to_string()));

    let err = clinic
        .booking
        .cancel_at(clinic.patient_id, 31337, at(21, 9, 0))
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::NotFound(_));
}

#[tokio::test]
async fn completed_appointments_cannot_be_cancelled() {
    let clinic = clinic().await;
    let (_, appointment_id) = booked(&clinic).await;
    clinic.store.set_appointment_status(appointment_id, AppointmentStatus::Completed).await;

    let err = clinic
        .booking
        .cancel_at(clinic.patient_id, appointment_id, at(21, 9, 0))
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::InvalidArgument(_));
}

#[tokio::test]
async fn missing_slot_is_an_internal_error() {
    let clinic = clinic().await;
    let (slot_id, appointment_id) = booked(&clinic).await;
    clinic.store.corrupt_remove_slot(slot_id).await;

    let err = clinic
        .booking
        .cancel_at(clinic.patient_id, appointment_id, at(21, 9, 0))
        .await
        .unwrap_err();
    assert_eq!(err, SchedulingError::Internal("Slot data is missing.".to_string()));
}

#[tokio::test]
async fn cancellation_window_follows_the_policy() {
    let clinic = clinic().await;
    let (_, appointment_id) = booked(&clinic).await;
    let strict = BookingService::with_store(clinic.store.clone(), CancellationPolicy::new(24 * 60));

    let err = strict
        .cancel_at(clinic.patient_id, appointment_id, at(21, 10, 0))
        .await
        .unwrap_err();
    assert_matches!(err, SchedulingError::InvalidArgument(_));

    let outcome = strict
        .cancel_at(clinic.patient_id, appointment_id, at(21, 8, 59))
        .await
        .unwrap();
    assert_eq!(outcome, CancellationOutcome::Cancelled);
}

// ==============================================================================
// SLOT DELETION AND AVAILABILITY
// ==============================================================================

#[tokio::test]
async fn deleting_a_booked_slot_is_refused() {
    let clinic = clinic().await;
    let (slot_id, _) = booked(&clinic).await;

    let err = clinic.slots.delete(slot_id).await.unwrap_err();
    assert_eq!(err, SchedulingError::InvalidArgument("Cannot delete a booked slot".to_string()));
    assert!(clinic.store.slot(slot_id).await.is_some());
}

#[tokio::test]
async fn deleted_slot_disappears_from_availability() {
    let clinic = clinic().await;
    let slot_id = first_slot(&clinic).await;

    let before = clinic.slots.available(clinic.doctor_id, "2026-02-22").await.unwrap();
    assert!(before.iter().any(|s| s.id == slot_id));

    clinic.slots.delete(slot_id).await.unwrap();

    let after = clinic.slots.available(clinic.doctor_id, "2026-02-22").await.unwrap();
    assert_eq!(after.len(), before.len() - 1);
    assert!(after.iter().all(|s| s.id != slot_id));

    assert_eq!(
        clinic.slots.delete(slot_id).await.unwrap_err(),
        SchedulingError::NotFound("Slot not found".to_string())
    );
}

#[tokio::test]
async fn slot_with_cancelled_history_cannot_be_deleted() {
    let clinic = clinic().await;
    let (slot_id, appointment_id) = booked(&clinic).await;
    clinic
        .booking
        .cancel_at(clinic.patient_id, appointment_id, at(21, 9, 0))
        .await
        .unwrap();

    let err = clinic.slots.delete(slot_id).await.unwrap_err();
    assert_eq!(
        err,
        SchedulingError::InvalidArgument("Cannot delete a slot with appointment history".to_string())
    );
    assert!(clinic.store.slot(slot_id).await.is_some());
}

#[tokio::test]
async fn availability_lists_unbooked_slots_of_the_day_in_order() {
    let clinic = clinic().await;
    clinic
        .store
        .add_slot(clinic.doctor_id, at(22, 11, 0), at(22, 11, 30))
        .await
        .unwrap();
    clinic
        .store
        .add_slot(clinic.doctor_id, at(23, 9, 0), at(23, 9, 30))
        .await
        .unwrap();
    let (booked_slot, _) = booked(&clinic).await;

    let slots = clinic.slots.available(clinic.doctor_id, "2026-02-22").await.unwrap();

    let starts: Vec<_> = slots.iter().map(|s| s.start_time).collect();
    assert_eq!(starts, vec![at(22, 9, 30), at(22, 11, 0)]);
    assert!(slots.iter().all(|s| s.id != booked_slot && !s.is_booked));
}

#[tokio::test]
async fn availability_requires_an_active_doctor_and_a_valid_date() {
    let clinic = clinic().await;
    let retired = clinic.store.add_doctor("Dr. Retired", None, false).await;

    assert_matches!(
        clinic.slots.available(retired, "2026-02-22").await,
        Err(SchedulingError::NotFound(_))
    );
    assert_matches!(
        clinic.slots.available(clinic.doctor_id, "22.02.2026").await,
        Err(SchedulingError::InvalidArgument(_))
    );
}

// ==============================================================================
// LISTINGS
// ==============================================================================

#[tokio::test]
async fn my_appointments_are_newest_first_with_summaries() {
    let clinic = clinic().await;
    clinic
        .slots
        .generate(&generate_request(clinic.doctor_id, "09:00", "11:00", 30))
        .await
        .unwrap();
    let slots = clinic.store.slots_of(clinic.doctor_id).await;

    let mut ids = Vec::new();
    for (i, slot) in slots.iter().take(3).enumerate() {
        let confirmation = clinic
            .booking
            .book_at(clinic.patient_id, &book_request(&clinic, slot.id), at(20, 8, 0))
            .await
            .unwrap();
        clinic
            .store
            .set_created_at(confirmation.appointment_id, at(20, 8, 0) + Duration::minutes(i as i64))
            .await;
        ids.push(confirmation.appointment_id);
    }

    let mine = clinic.booking.my_appointments(clinic.patient_id).await.unwrap();
    let listed: Vec<i64> = mine.iter().map(|a| a.id).collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let doctor = mine[0].doctor.as_ref().unwrap();
    assert_eq!(doctor.full_name, "Dr. Lina Ahmad");
    assert_eq!(doctor.clinic_name.as_deref(), Some("Smile Clinic"));
    assert_eq!(mine[2].slot.as_ref().unwrap().start_time, at(22, 9, 0));

    let stranger = clinic.store.add_user("nobody@example.com", "Nobody").await;
    assert!(clinic.booking.my_appointments(stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_search_filters_and_pages() {
    let clinic = clinic().await;
    let cardiologist = clinic.store.add_doctor("Dr. Omar Saleh", Some("HeartCare Center"), true).await;
    let second_patient = clinic.store.add_user("omar.fan@clinic.test", "Fan").await;

    clinic
        .slots
        .generate(&generate_request(clinic.doctor_id, "09:00", "11:00", 30))
        .await
        .unwrap();
    clinic
        .store
        .add_slot(cardiologist, at(25, 9, 0), at(25, 9, 30))
        .await
        .unwrap();

    let lina_slots = clinic.store.slots_of(clinic.doctor_id).await;
    let omar_slot = clinic.store.slots_of(cardiologist).await[0].id;

    let mut appointments = Vec::new();
    for slot in lina_slots.iter().take(3) {
        appointments.push(
            clinic
                .booking
                .book_at(clinic.patient_id, &book_request(&clinic, slot.id), at(20, 8, 0))
                .await
                .unwrap()
                .appointment_id,
        );
    }
    appointments.push(
        clinic
            .booking
            .book_at(
                second_patient,
                &BookAppointmentRequest { doctor_id: cardiologist, slot_id: omar_slot },
                at(20, 8, 0),
            )
            .await
            .unwrap()
            .appointment_id,
    );
    for (i, id) in appointments.iter().enumerate() {
        clinic.store.set_created_at(*id, at(20, 8, 0) + Duration::minutes(i as i64)).await;
    }
    clinic
        .booking
        .cancel_at(clinic.patient_id, appointments[0], at(21, 8, 0))
        .await
        .unwrap();

    let everything: AppointmentFilter = AppointmentSearchQuery::default().into();
    let page = clinic.booking.search(&everything).await.unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.items[0].id, appointments[3]);

    let by_email: AppointmentFilter = AppointmentSearchQuery {
        user_email: Some("OMAR.FAN".to_string()),
        ..Default::default()
    }
    .into();
    let page = clinic.booking.search(&by_email).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].user.as_ref().unwrap().email, "omar.fan@clinic.test");

    let cancelled: AppointmentFilter = AppointmentSearchQuery {
        status: Some("cancelled".to_string()),
        ..Default::default()
    }
    .into();
    let page = clinic.booking.search(&cancelled).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, appointments[0]);

    let on_the_22nd: AppointmentFilter = AppointmentSearchQuery {
        from: Some("2026-02-22".to_string()),
        to: Some("2026-02-22".to_string()),
        doctor_id: Some(clinic.doctor_id),
        page: Some(2),
        page_size: Some(2),
        ..Default::default()
    }
    .into();
    let page = clinic.booking.search(&on_the_22nd).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, appointments[0]);
}
