// libs/appointment-cell/src/services/cancellation.rs
use chrono::{DateTime, Utc};

use shared_config::AppConfig;

use crate::error::SchedulingError;

pub const DEFAULT_CANCELLATION_WINDOW_MINUTES: i64 = 60;

/// Time gate on cancellations: an appointment can only be cancelled while
/// strictly more than `window_minutes` remain before its slot starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    window_minutes: i64,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CANCELLATION_WINDOW_MINUTES)
    }
}

impl CancellationPolicy {
    pub fn new(window_minutes: i64) -> Self {
        Self { window_minutes: window_minutes.max(0) }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.cancellation_window_minutes)
    }

    pub fn window_minutes(&self) -> i64 {
        self.window_minutes
    }

    /// Fractional minutes from `now` until `slot_start`; negative once the slot has begun.
    pub fn minutes_left(slot_start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        (slot_start - now).num_milliseconds() as f64 / 60_000.0
    }

    pub fn check(&self, slot_start: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), SchedulingError> {
        if Self::minutes_left(slot_start, now) <= self.window_minutes as f64 {
            return Err(SchedulingError::InvalidArgument(format!(
                "Cancellation is not allowed within {} of the appointment.",
                self.describe_window()
            )));
        }
        Ok(())
    }

    fn describe_window(&self) -> String {
        match self.window_minutes {
            60 => "1 hour".to_string(),
            m if m > 0 && m % 60 == 0 => format!("{} hours", m / 60),
            1 => "1 minute".to_string(),
            m => format!("{} minutes", m),
        }
    }
}
