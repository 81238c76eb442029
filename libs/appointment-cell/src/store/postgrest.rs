// libs/appointment-cell/src/store/postgrest.rs
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::{DbError, SupabaseClient};

use crate::models::{
    AdminAppointmentView, Appointment, AppointmentFilter, AvailabilitySlot, NewSlot,
    UserAppointmentView,
};
use crate::store::SchedulingStore;

const SLOT_COLUMNS: &str = "id,doctor_id,start_time,end_time,is_booked";

/// [`SchedulingStore`] backed by PostgREST. Multi-row writes go through the
/// `book_slot` and `cancel_appointment` database functions.
#[derive(Clone)]
pub struct PostgrestStore {
    supabase: SupabaseClient,
}

#[derive(Debug, Deserialize)]
struct StartTimeRow {
    start_time: DateTime<Utc>,
}

impl PostgrestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self { supabase: SupabaseClient::new(config) }
    }

    pub fn with_client(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    fn representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }
}

/// Query-string form of a timestamp (`2026-02-22T09:00:00Z`, percent-encoded).
fn timestamp_param(value: DateTime<Utc>) -> String {
    urlencoding::encode(&value.to_rfc3339_opts(SecondsFormat::Secs, true)).into_owned()
}

/// Escapes the characters PostgREST `ilike` treats as wildcards so the value matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Appends the admin search filters to `query`.
fn push_search_filters(query: &mut Vec<String>, filter: &AppointmentFilter) {
    if let Some(status) = filter.status {
        query.push(format!("status=eq.{}", status));
    }
    if let Some(doctor_id) = filter.doctor_id {
        query.push(format!("doctor_id=eq.{}", doctor_id));
    }
    if let Some(email) = filter.user_email.as_deref() {
        query.push(format!("user.email=ilike.*{}*", urlencoding::encode(&escape_like(email))));
    }
    if let Some(from) = filter.starts_from {
        query.push(format!("slot.start_time=gte.{}", timestamp_param(from)));
    }
    if let Some(before) = filter.starts_before {
        query.push(format!("slot.start_time=lt.{}", timestamp_param(before)));
    }
}

pub(crate) fn search_path(filter: &AppointmentFilter) -> String {
    let mut query = vec![
        "select=id,status,created_at,\
         user:users!inner(id,email,full_name),\
         doctor:doctors(id,full_name,clinic_name),\
         slot:availability_slots!inner(id,start_time,end_time)"
            .to_string(),
    ];
    push_search_filters(&mut query, filter);
    query.push("order=created_at.desc".to_string());
    query.push(format!("limit={}", filter.page_size));
    query.push(format!("offset={}", filter.offset()));

    format!("/rest/v1/appointments?{}", query.join("&"))
}

#[async_trait]
impl SchedulingStore for PostgrestStore {
    async fn doctor_exists(&self, doctor_id: i64, active_only: bool) -> Result<bool, DbError> {
        let mut path = format!("/rest/v1/doctors?id=eq.{}&select=id", doctor_id);
        if active_only {
            path.push_str("&is_active=eq.true");
        }

        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(!rows.is_empty())
    }

    async fn slot_start_times(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, DbError> {
        let path = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&start_time=gte.{}&start_time=lt.{}&select=start_time",
            doctor_id,
            timestamp_param(from),
            timestamp_param(to)
        );

        let rows: Vec<StartTimeRow> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().map(|r| r.start_time).collect())
    }

    async fn insert_slots(&self, slots: &[NewSlot]) -> Result<usize, DbError> {
        if slots.is_empty() {
            return Ok(0);
        }

        // A single POST with an array body is one statement, so it is all-or-nothing.
        let body = serde_json::to_value(slots)?;
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &format!("/rest/v1/availability_slots?select={}", SLOT_COLUMNS),
                None,
                Some(body),
                Some(Self::representation()),
            )
            .await?;

        debug!("Inserted {} slots", rows.len());
        Ok(rows.len())
    }

    async fn get_slot(&self, slot_id: i64) -> Result<Option<AvailabilitySlot>, DbError> {
        let path = format!("/rest/v1/availability_slots?id=eq.{}&select={}", slot_id, SLOT_COLUMNS);
        let rows: Vec<AvailabilitySlot> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn available_slots(
        &self,
        doctor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AvailabilitySlot>, DbError> {
        let path = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&is_booked=eq.false&start_time=gte.{}&start_time=lt.{}&select={}&order=start_time.asc",
            doctor_id,
            timestamp_param(from),
            timestamp_param(to),
            SLOT_COLUMNS
        );

        self.supabase.request(Method::GET, &path, None, None).await
    }

    async fn delete_unbooked_slot(&self, slot_id: i64) -> Result<bool, DbError> {
        let path = format!(
            "/rest/v1/availability_slots?id=eq.{}&is_booked=eq.false&select=id",
            slot_id
        );

        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, None, Some(Self::representation()))
            .await?;

        Ok(!deleted.is_empty())
    }

    async fn book_slot(
        &self,
        user_id: i64,
        doctor_id: i64,
        slot_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, DbError> {
        self.supabase
            .rpc(
                "book_slot",
                json!({
                    "p_user_id": user_id,
                    "p_doctor_id": doctor_id,
                    "p_slot_id": slot_id,
                    "p_now": now.to_rfc3339_opts(SecondsFormat::Millis, true),
                }),
            )
            .await
    }

    async fn find_user_appointment(
        &self,
        appointment_id: i64,
        user_id: i64,
    ) -> Result<Option<Appointment>, DbError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&user_id=eq.{}&select=id,user_id,doctor_id,slot_id,status,created_at,slot:availability_slots({})",
            appointment_id, user_id, SLOT_COLUMNS
        );

        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn cancel_appointment(&self, appointment_id: i64, user_id: i64) -> Result<bool, DbError> {
        self.supabase
            .rpc(
                "cancel_appointment",
                json!({
                    "p_appointment_id": appointment_id,
                    "p_user_id": user_id,
                }),
            )
            .await
    }

    async fn user_appointments(&self, user_id: i64) -> Result<Vec<UserAppointmentView>, DbError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}\
             &select=id,status,created_at,doctor:doctors(id,full_name,clinic_name),slot:availability_slots(id,start_time,end_time)\
             &order=created_at.desc",
            user_id
        );

        self.supabase.request(Method::GET, &path, None, None).await
    }

    async fn search_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<(Vec<AdminAppointmentView>, i64), DbError> {
        self.supabase.request_with_count(&search_path(filter)).await
    }
}
