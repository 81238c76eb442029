use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::error::DoctorError;
use crate::models::{Doctor, DoctorListQuery, Service};

pub(crate) const DOCTOR_COLUMNS: &str =
    "id,full_name,title,bio,image_url,clinic_name,fee,rating,is_active,service_id,service:services(id,name)";

/// Public read side: services and active doctors.
pub struct CatalogService {
    supabase: SupabaseClient,
}

impl CatalogService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_services(&self) -> Result<Vec<Service>, DoctorError> {
        let services: Vec<Service> = self
            .supabase
            .request(Method::GET, "/rest/v1/services?select=id,name&order=name.asc", None, None)
            .await?;
        Ok(services)
    }

    pub async fn service_exists(&self, service_id: i64) -> Result<bool, DoctorError> {
        let path = format!("/rest/v1/services?id=eq.{}&select=id", service_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(!rows.is_empty())
    }

    pub async fn create_service(&self, name: &str) -> Result<Service, DoctorError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(DoctorError::Validation(
                "Service name must be 1 to 100 characters".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let created: Vec<Service> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/services?select=id,name",
                None,
                Some(json!({ "name": name })),
                Some(headers),
            )
            .await?;

        let service = created
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Validation("Failed to create service".to_string()))?;

        info!("Created service {} ({})", service.name, service.id);
        Ok(service)
    }

    /// Active doctors ordered by name, optionally narrowed to a service and a
    /// case-insensitive name or title match.
    pub async fn list_active_doctors(&self, query: &DoctorListQuery) -> Result<Vec<Doctor>, DoctorError> {
        let path = active_doctors_path(query);
        debug!("Listing doctors: {}", path);

        let doctors: Vec<Doctor> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(doctors)
    }

    pub async fn get_active_doctor(&self, doctor_id: i64) -> Result<Doctor, DoctorError> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&is_active=eq.true&select={}",
            doctor_id, DOCTOR_COLUMNS
        );

        let doctors: Vec<Doctor> = self.supabase.request(Method::GET, &path, None, None).await?;
        doctors.into_iter().next().ok_or(DoctorError::NotFound)
    }
}

fn active_doctors_path(query: &DoctorListQuery) -> String {
    let mut path = format!("/rest/v1/doctors?is_active=eq.true&select={}", DOCTOR_COLUMNS);

    if let Some(service_id) = query.service_id {
        path.push_str(&format!("&service_id=eq.{}", service_id));
    }

    let needle: String = query
        .q
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"' | '\\'))
        .collect();
    let needle = needle.trim();
    if !needle.is_empty() {
        let needle = urlencoding::encode(needle);
        path.push_str(&format!(
            "&or=(full_name.ilike.*{0}*,title.ilike.*{0}*)",
            needle
        ));
    }

    path.push_str("&order=full_name.asc");
    path
}
