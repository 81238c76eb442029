use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{DbError, SupabaseClient};

use crate::error::DoctorError;
use crate::models::{Doctor, UpsertDoctorRequest};
use crate::services::catalog::{CatalogService, DOCTOR_COLUMNS};

/// Admin side of the doctor records. Doctors are never deleted, only deactivated.
pub struct DoctorService {
    supabase: SupabaseClient,
    catalog: CatalogService,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            catalog: CatalogService::new(config),
        }
    }

    fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    /// All doctors, active or not, newest first.
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        let path = format!("/rest/v1/doctors?select={}&order=id.desc", DOCTOR_COLUMNS);
        let doctors: Vec<Doctor> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(doctors)
    }

    pub async fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select={}", doctor_id, DOCTOR_COLUMNS);
        let doctors: Vec<Doctor> = self.supabase.request(Method::GET, &path, None, None).await?;
        doctors.into_iter().next().ok_or(DoctorError::NotFound)
    }

    pub async fn create_doctor(&self, request: &UpsertDoctorRequest) -> Result<i64, DoctorError> {
        let row = request.validated()?;
        self.ensure_service(row.service_id).await?;

        let created: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors?select=id",
                None,
                Some(doctor_body(&row)),
                Some(Self::return_representation()),
            )
            .await
            .map_err(service_reference_error)?;

        let id = created
            .first()
            .and_then(|row| row["id"].as_i64())
            .ok_or_else(|| DoctorError::Database(DbError::Api {
                status: 500,
                message: "Insert returned no id".to_string(),
            }))?;

        info!("Created doctor {} ({})", row.full_name, id);
        Ok(id)
    }

    pub async fn update_doctor(&self, doctor_id: i64, request: &UpsertDoctorRequest) -> Result<(), DoctorError> {
        let row = request.validated()?;

        // Existence first so that an unknown doctor is a 404 even with a bad service.
        self.get_doctor(doctor_id).await?;
        self.ensure_service(row.service_id).await?;

        let path = format!("/rest/v1/doctors?id=eq.{}&select=id", doctor_id);
        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(doctor_body(&row)),
                Some(Self::return_representation()),
            )
            .await
            .map_err(service_reference_error)?;

        if updated.is_empty() {
            return Err(DoctorError::NotFound);
        }

        debug!("Updated doctor {}", doctor_id);
        Ok(())
    }

    /// Soft delete.
    pub async fn deactivate_doctor(&self, doctor_id: i64) -> Result<(), DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id", doctor_id);
        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(json!({ "is_active": false })),
                Some(Self::return_representation()),
            )
            .await?;

        if updated.is_empty() {
            return Err(DoctorError::NotFound);
        }

        info!("Deactivated doctor {}", doctor_id);
        Ok(())
    }

    async fn ensure_service(&self, service_id: i64) -> Result<(), DoctorError> {
        if !self.catalog.service_exists(service_id).await? {
            warn!("Rejected doctor write with unknown service {}", service_id);
            return Err(DoctorError::InvalidServiceId);
        }
        Ok(())
    }
}

fn doctor_body(row: &UpsertDoctorRequest) -> Value {
    json!({
        "full_name": row.full_name,
        "title": row.title,
        "bio": row.bio,
        "image_url": row.image_url,
        "clinic_name": row.clinic_name,
        "fee": row.fee,
        "rating": row.rating,
        "service_id": row.service_id,
        "is_active": row.is_active
    })
}

/// A service removed between the check and the write surfaces as a foreign key violation.
fn service_reference_error(err: DbError) -> DoctorError {
    if err.is_foreign_key_violation() {
        DoctorError::InvalidServiceId
    } else {
        err.into()
    }
}
