// libs/appointment-cell/src/services/generator.rs
//
// Pure slot generation: turns a (date, start, end, granularity) window into an
// ordered run of disjoint full-length slots.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::error::SchedulingError;
use crate::models::{parse_date, parse_time_of_day, start_of_day, NewSlot};

pub const MIN_SLOT_MINUTES: i64 = 5;
pub const MAX_SLOT_MINUTES: i64 = 240;

/// A validated generation window on a single calendar day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub slot_minutes: i64,
}

impl SlotWindow {
    pub fn parse(
        date: &str,
        start_time: &str,
        end_time: &str,
        slot_minutes: i64,
    ) -> Result<Self, SchedulingError> {
        let date = parse_date(date).ok_or_else(|| {
            SchedulingError::InvalidArgument(
                "Invalid date format. Use YYYY-MM-DD (e.g. 2026-02-22)".to_string(),
            )
        })?;

        let start = parse_time_of_day(start_time).ok_or_else(|| {
            SchedulingError::InvalidArgument(
                "Invalid start_time format. Use HH:MM (e.g. 09:00)".to_string(),
            )
        })?;

        let end = parse_time_of_day(end_time).ok_or_else(|| {
            SchedulingError::InvalidArgument(
                "Invalid end_time format. Use HH:MM (e.g. 12:00)".to_string(),
            )
        })?;

        if end <= start {
            return Err(SchedulingError::InvalidArgument(
                "end_time must be after start_time".to_string(),
            ));
        }

        if !(MIN_SLOT_MINUTES..=MAX_SLOT_MINUTES).contains(&slot_minutes) {
            return Err(SchedulingError::InvalidArgument(format!(
                "slot_minutes must be between {} and {}",
                MIN_SLOT_MINUTES, MAX_SLOT_MINUTES
            )));
        }

        Ok(Self { date, start, end, slot_minutes })
    }

    pub fn start_instant(&self) -> DateTime<Utc> {
        self.date.and_time(self.start).and_utc()
    }

    pub fn end_instant(&self) -> DateTime<Utc> {
        self.date.and_time(self.end).and_utc()
    }

    /// `[midnight, next midnight)` of the window's day.
    pub fn day_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let day_start = start_of_day(self.date);
        (day_start, day_start + Duration::days(1))
    }
}

/// Generates `[cursor, cursor + slot_minutes)` slots from the window start.
/// A trailing remainder shorter than `slot_minutes` is dropped, never truncated.
pub fn generate_slots(doctor_id: i64, window: &SlotWindow) -> Vec<NewSlot> {
    let step = Duration::minutes(window.slot_minutes);
    let end = window.end_instant();

    let mut slots = Vec::new();
    let mut cursor = window.start_instant();

    while cursor + step <= end {
        let slot_end = cursor + step;
        slots.push(NewSlot {
            doctor_id,
            start_time: cursor,
            end_time: slot_end,
            is_booked: false,
        });
        cursor = slot_end;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn window(start: &str, end: &str, minutes: i64) -> SlotWindow {
        SlotWindow::parse("2026-02-22", start, end, minutes).unwrap()
    }

    #[test]
    fn one_hour_in_half_hours_gives_two_slots() {
        let slots = generate_slots(7, &window("09:00", "10:00", 30));

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start_time.to_rfc3339(), "2026-02-22T09:00:00+00:00");
        assert_eq!(slots[0].end_time.to_rfc3339(), "2026-02-22T09:30:00+00:00");
        assert_eq!(slots[1].start_time.to_rfc3339(), "2026-02-22T09:30:00+00:00");
        assert_eq!(slots[1].end_time.to_rfc3339(), "2026-02-22T10:00:00+00:00");
        assert!(slots.iter().all(|s| s.doctor_id == 7 && !s.is_booked));
    }

    #[test]
    fn partial_trailing_slot_is_discarded() {
        let w = window("09:00", "10:10", 30);
        let slots = generate_slots(1, &w);

        assert_eq!(slots.len(), 2);
        assert!(slots.last().unwrap().end_time <= w.end_instant());
    }

    #[test]
    fn slot_count_is_floor_of_range_over_granularity() {
        let cases = [
            ("08:00", "17:00", 30),
            ("08:00", "17:00", 45),
            ("09:15", "09:50", 5),
            ("00:00", "23:59", 240),
            ("13:00", "13:07", 7),
        ];

        for (start, end, minutes) in cases {
            let w = window(start, end, minutes);
            let total = (w.end_instant() - w.start_instant()).num_minutes();
            let slots = generate_slots(1, &w);

            assert_eq!(slots.len() as i64, total / minutes, "{}-{} by {}", start, end, minutes);
            for pair in slots.windows(2) {
                assert_eq!(pair[0].end_time, pair[1].start_time);
            }
            for slot in &slots {
                assert_eq!((slot.end_time - slot.start_time).num_minutes(), minutes);
                assert!(slot.end_time <= w.end_instant());
            }
        }
    }

    #[test]
    fn range_shorter_than_granularity_generates_nothing() {
        assert!(generate_slots(1, &window("09:00", "09:20", 30)).is_empty());
    }

    #[test]
    fn end_must_follow_start() {
        assert_matches!(
            SlotWindow::parse("2026-02-22", "10:00", "10:00", 30),
            Err(SchedulingError::InvalidArgument(_))
        );
        assert_matches!(
            SlotWindow::parse("2026-02-22", "11:00", "10:00", 30),
            Err(SchedulingError::InvalidArgument(_))
        );
    }

    #[test]
    fn malformed_inputs_are_invalid_arguments() {
        assert_matches!(
            SlotWindow::parse("22-02-2026", "09:00", "10:00", 30),
            Err(SchedulingError::InvalidArgument(_))
        );
        assert_matches!(
            SlotWindow::parse("2026-02-22", "nine", "10:00", 30),
            Err(SchedulingError::InvalidArgument(_))
        );
        assert_matches!(
            SlotWindow::parse("2026-02-30", "09:00", "10:00", 30),
            Err(SchedulingError::InvalidArgument(_))
        );
    }

    #[test]
    fn granularity_is_bounded() {
        for minutes in [0, -30, 4, 241] {
            assert_matches!(
                SlotWindow::parse("2026-02-22", "09:00", "17:00", minutes),
                Err(SchedulingError::InvalidArgument(_))
            );
        }
        assert!(SlotWindow::parse("2026-02-22", "09:00", "17:00", 5).is_ok());
        assert!(SlotWindow::parse("2026-02-22", "09:00", "17:00", 240).is_ok());
    }
}
