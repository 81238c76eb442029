// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// CORE RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub doctor_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
}

/// A slot produced by the generator that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSlot {
    pub doctor_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_booked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub user_id: i64,
    pub doctor_id: i64,
    pub slot_id: i64,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub slot: Option<AvailabilitySlot>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Booked,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn is_active(&self) -> bool {
        *self == AppointmentStatus::Booked
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "booked" => Ok(AppointmentStatus::Booked),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            other => Err(format!("Unknown appointment status: {}", other)),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsRequest {
    pub doctor_id: i64,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Time of day, `HH:MM`.
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: i64,
}

fn default_slot_minutes() -> i64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateSlotsResult {
    pub created: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: i64,
    pub slot_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingConfirmation {
    pub appointment_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancellationOutcome {
    Cancelled,
    AlreadyCancelled,
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: String,
}

// ==============================================================================
// LISTING VIEWS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub clinic_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSummary {
    #[serde(default)]
    pub id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One entry of `GET /appointments/my`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAppointmentView {
    pub id: i64,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub doctor: Option<DoctorSummary>,
    pub slot: Option<SlotSummary>,
}

/// One entry of the admin appointment search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAppointmentView {
    pub id: i64,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub user: Option<UserSummary>,
    pub doctor: Option<DoctorSummary>,
    pub slot: Option<SlotSummary>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw query string of the admin appointment search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentSearchQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub doctor_id: Option<i64>,
    pub user_email: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Normalized, typed filter handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentFilter {
    pub page: i64,
    pub page_size: i64,
    pub status: Option<AppointmentStatus>,
    pub doctor_id: Option<i64>,
    pub user_email: Option<String>,
    /// Inclusive lower bound on the slot start.
    pub starts_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the slot start.
    pub starts_before: Option<DateTime<Utc>>,
}

impl AppointmentFilter {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl From<AppointmentSearchQuery> for AppointmentFilter {
    /// Out-of-range paging falls back to defaults; unparseable filters are ignored.
    fn from(query: AppointmentSearchQuery) -> Self {
        let page = query.page.filter(|p| *p >= 1).unwrap_or(1);
        let page_size = query
            .page_size
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let status = query
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| s.parse().ok());

        let user_email = query
            .user_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());

        let starts_from = query
            .from
            .as_deref()
            .and_then(parse_date)
            .map(start_of_day);

        let starts_before = query
            .to
            .as_deref()
            .and_then(parse_date)
            .map(|d| start_of_day(d) + Duration::days(1));

        Self {
            page,
            page_size,
            status,
            doctor_id: query.doctor_id,
            user_email,
            starts_from,
            starts_before,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentPage {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub items: Vec<AdminAppointmentView>,
}

impl AppointmentPage {
    pub fn new(filter: &AppointmentFilter, total: i64, items: Vec<AdminAppointmentView>) -> Self {
        let total_pages = (total + filter.page_size - 1) / filter.page_size;
        Self {
            page: filter.page,
            page_size: filter.page_size,
            total,
            total_pages,
            items,
        }
    }
}

// ==============================================================================
// DATE/TIME WIRE FORMAT
// ==============================================================================

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Midnight UTC of the given calendar day.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
