use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;

use shared_config::AppConfig;
use shared_models::auth::User;

static NEXT_TEST_USER_ID: AtomicI64 = AtomicI64::new(1000);

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_role_key: "test-service-role-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_role_key: self.supabase_service_role_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            jwt_issuer: "clinic-booking".to_string(),
            jwt_audience: "clinic-booking-clients".to_string(),
            jwt_expires_minutes: 120,
            admin_email: None,
            admin_password: None,
            cancellation_window_minutes: 60,
            server_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "user")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: NEXT_TEST_USER_ID.fetch_add(1, Ordering::Relaxed),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn with_id(id: i64, email: &str, role: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "user")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.to_string(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id.to_string(),
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Row shapes as PostgREST returns them for the clinic tables.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn service_response(id: i64, name: &str) -> serde_json::Value {
        json!({ "id": id, "name": name })
    }

    pub fn doctor_response(id: i64, full_name: &str, service_id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": full_name,
            "title": "Consultant",
            "bio": "Experienced physician",
            "image_url": null,
            "clinic_name": "Main Clinic",
            "fee": 40.0,
            "rating": 4.5,
            "is_active": true,
            "service_id": service_id,
            "service": { "id": service_id, "name": "Cardiology" }
        })
    }

    pub fn slot_response(id: i64, doctor_id: i64, start: &str, end: &str, is_booked: bool) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "start_time": start,
            "end_time": end,
            "is_booked": is_booked
        })
    }

    pub fn user_response(id: i64, email: &str, password_hash: &str, role: &str) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": "Test User",
            "email": email,
            "password_hash": password_hash,
            "role": role,
            "created_at": "2026-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}
