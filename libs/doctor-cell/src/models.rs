use serde::{Deserialize, Serialize};

use crate::error::DoctorError;

pub const MAX_FEE: f64 = 10_000.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub full_name: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub clinic_name: Option<String>,
    pub fee: f64,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub service_id: i64,
    #[serde(default)]
    pub service: Option<Service>,
}

/// Full replacement payload for admin create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertDoctorRequest {
    pub full_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub clinic_name: Option<String>,
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub rating: Option<f64>,
    pub service_id: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl UpsertDoctorRequest {
    /// Checks field bounds and returns the row to persist, with the name trimmed
    /// and the fee rounded to cents.
    pub fn validated(&self) -> Result<UpsertDoctorRequest, DoctorError> {
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(DoctorError::Validation("full_name is required".to_string()));
        }
        check_len("full_name", Some(&full_name), 150)?;
        check_len("title", self.title.as_deref(), 150)?;
        check_len("bio", self.bio.as_deref(), 2000)?;
        check_len("image_url", self.image_url.as_deref(), 500)?;
        check_len("clinic_name", self.clinic_name.as_deref(), 200)?;

        if !self.fee.is_finite() || !(0.0..=MAX_FEE).contains(&self.fee) {
            return Err(DoctorError::Validation(format!(
                "fee must be between 0 and {}",
                MAX_FEE
            )));
        }

        if let Some(rating) = self.rating {
            if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
                return Err(DoctorError::Validation("rating must be between 0 and 5".to_string()));
            }
        }

        Ok(UpsertDoctorRequest {
            full_name,
            fee: (self.fee * 100.0).round() / 100.0,
            ..self.clone()
        })
    }
}

fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<(), DoctorError> {
    match value {
        Some(v) if v.chars().count() > max => Err(DoctorError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorListQuery {
    pub service_id: Option<i64>,
    pub q: Option<String>,
}
