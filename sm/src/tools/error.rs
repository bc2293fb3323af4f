//! Tool error types

use serde_json::json;
use thiserror::Error;

use crate::api::ApiError;
use crate::response::CallToolResult;

/// Errors a handler can return
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ToolError {
    /// Error envelope for this failure
    ///
    /// Upstream errors carry the HTTP status as details when there was one.
    pub fn to_result(&self) -> CallToolResult {
        match self {
            ToolError::Api(err) => {
                let details = err.status_code().map(|status| json!({ "statusCode": status }));
                CallToolResult::error(format!("API Error: {err}"), details.as_ref())
            }
            ToolError::InvalidInput(_) => CallToolResult::error(self.to_string(), None),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::InvalidInput(err.to_string())
    }
}
