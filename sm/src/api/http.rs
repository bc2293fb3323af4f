//! reqwest-backed SwipeOne client

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

use super::{ApiClient, ApiError, ApiRequest};
use crate::config::ApiConfig;
use crate::redact;

/// SwipeOne REST API client
///
/// Holds one pooled `reqwest::Client` with the API key and content headers
/// baked in. Every request gets its own `X-Request-ID`.
pub struct SwipeOneClient {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl SwipeOneClient {
    /// Create a new client from configuration
    ///
    /// Fails when no API key has been resolved or the key is not a valid
    /// header value.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "from_config: called");
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| ApiError::Request(format!("API key not set ({})", config.api_key_env)))?;

        let mut key_value = HeaderValue::from_str(api_key).map_err(|e| ApiError::Request(e.to_string()))?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("swipeone-mcp/", env!("CARGO_PKG_VERSION"))),
        );

        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else if err.is_builder() {
            ApiError::Request(err.to_string())
        } else {
            ApiError::NoResponse
        }
    }
}

fn new_request_id() -> String {
    format!("req_{}", Uuid::now_v7().simple())
}

/// Parse a response body, falling back to the raw text
fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[async_trait]
impl ApiClient for SwipeOneClient {
    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let request_id = new_request_id();
        let url = self.url_for(&request.path);
        debug!(%request_id, method = %request.method, %url, "request: called");

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header("X-Request-ID", &request_id);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            debug!(%request_id, body = %redact::sanitize(body), "request: sending body");
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            error!(%request_id, error = %e, "request: send failed");
            self.map_send_error(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let body = parse_body(&text);
            error!(
                %request_id,
                status = status.as_u16(),
                body = %redact::sanitize(&body),
                "request: API error"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(%request_id, status = status.as_u16(), "request: success");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}
