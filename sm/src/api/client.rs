//! ApiClient trait definition

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::ApiError;

/// A single call against the SwipeOne REST API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the API base URL, starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Add query parameters from the scalar fields of a JSON object
    pub fn with_query_object(mut self, params: &Value) -> Self {
        if let Some(map) = params.as_object() {
            for (key, value) in map {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                self.query.push((key.clone(), rendered));
            }
        }
        self
    }
}

/// Stateless HTTP client - each call is independent
///
/// Returns the parsed JSON body on success, or an [`ApiError`] carrying the
/// upstream status and body when the server answered with an error.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn request(&self, request: ApiRequest) -> Result<Value, ApiError>;
}
