//! API error types

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while talking to the SwipeOne API
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("API request failed with status {status}")]
    Status { status: u16, body: Value },

    #[error("No response received from API server")]
    NoResponse,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error(
        "Invalid {kind} format. Must contain only alphanumeric characters, hyphens, and underscores (max 100 chars)"
    )]
    InvalidId { kind: &'static str },

    #[error("Request setup failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Upstream HTTP status, when the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw upstream body, when the server answered
    pub fn body(&self) -> Option<&Value> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

}
