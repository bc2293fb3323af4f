//! Result envelopes returned for every tool call
//!
//! The envelope is the `CallToolResult` shape of MCP:
//! `{content: [{type: "text", text}], isError?, metadata?}`. Clients key off
//! `isError`, so every failure in the dispatch pipeline ends up here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::schema::FieldError;

/// One block of text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Content::Text { text } => text,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The outcome of a tool call as seen by the protocol layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<Content>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CallToolResult {
    /// Success envelope carrying `payload` as pretty-printed JSON
    pub fn success(payload: &Value) -> Self {
        debug!("CallToolResult::success: called");
        let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        Self {
            content: vec![Content::text(text)],
            is_error: false,
            metadata: None,
        }
    }

    /// Error envelope; `details` is appended as a JSON block
    pub fn error(message: impl Into<String>, details: Option<&Value>) -> Self {
        debug!("CallToolResult::error: called");
        let message = message.into();
        let text = match details {
            Some(details) => {
                let rendered = serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
                format!("{message}\n\nDetails: {rendered}")
            }
            None => message,
        };

        Self {
            content: vec![Content::text(text)],
            is_error: true,
            metadata: None,
        }
    }

    /// Error envelope listing every field violation, one per line
    pub fn validation_error(errors: &[FieldError]) -> Self {
        let lines = errors
            .iter()
            .map(|e| format!("- {}: {}", e.path, e.message))
            .collect::<Vec<_>>()
            .join("\n");
        Self::error(format!("Validation failed:\n{lines}"), None)
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// All text blocks joined by newlines
    pub fn text(&self) -> String {
        self.content.iter().map(Content::as_text).collect::<Vec<_>>().join("\n")
    }
}
