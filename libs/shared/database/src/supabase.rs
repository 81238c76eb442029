use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION, CONTENT_RANGE},
    Method, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::error::DbError;

/// Error payload returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let api_key = if self.service_key.is_empty() { &self.anon_key } else { &self.service_key };
        if let Ok(value) = HeaderValue::from_str(api_key) {
            headers.insert("apikey", value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // The backend talks to PostgREST with its service key unless a caller token is given
        let bearer = auth_token.unwrap_or(api_key);
        if !bearer.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", bearer)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, DbError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(Self::classify_error(status, &error_text));
        }

        Ok(response)
    }

    fn classify_error(status: StatusCode, error_text: &str) -> DbError {
        let parsed: Option<PostgrestError> = serde_json::from_str(error_text).ok();
        let code = parsed.as_ref().and_then(|e| e.code.clone());
        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| error_text.to_string());

        match status.as_u16() {
            409 => {
                warn!("Constraint rejected write ({:?}): {}", code, message);
                DbError::Conflict { code, message }
            }
            404 => DbError::NotFound(message),
            400 => {
                if let Some(details) = parsed.as_ref().and_then(|e| e.details.as_deref()) {
                    debug!("Bad request details: {}", details);
                }
                DbError::BadRequest(message)
            }
            401 | 403 => {
                error!("API auth error ({}): {}", status, message);
                DbError::Auth(message)
            }
            _ => {
                error!("API error ({}): {}", status, error_text);
                DbError::Api { status: status.as_u16(), message }
            }
        }
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, auth_token, body, headers).await?;
        let bytes = response.bytes().await?;
        let data = serde_json::from_slice::<T>(&bytes)?;
        Ok(data)
    }

    /// Runs a request whose response body is irrelevant (`Prefer: return=minimal`).
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<(), DbError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=minimal"));
        self.send(method, path, None, body, Some(headers)).await?;
        Ok(())
    }

    /// GET with `Prefer: count=exact`, returning the rows and the total from `Content-Range`.
    pub async fn request_with_count<T>(
        &self,
        path: &str,
    ) -> Result<(Vec<T>, i64), DbError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(Method::GET, path, None, None, Some(headers)).await?;

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let bytes = response.bytes().await?;
        let rows: Vec<T> = serde_json::from_slice(&bytes)?;
        let total = total.unwrap_or(rows.len() as i64);

        Ok((rows, total))
    }

    /// Calls a PostgreSQL function exposed under `/rest/v1/rpc/`.
    pub async fn rpc<T>(&self, function: &str, args: Value) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, None, Some(args)).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// Parses the total out of a PostgREST `Content-Range` header such as `0-19/57` or `*/0`.
pub fn parse_content_range_total(header: &str) -> Option<i64> {
    header.rsplit('/').next().and_then(|total| total.trim().parse().ok())
}
