//! ToolContext - per-call execution context for handlers

use tracing::debug;

/// Execution context for a single tool call
///
/// Built by the dispatcher after validation and workspace resolution, then
/// handed to the handler by value. `workspace_id` is empty for tools that
/// address a contact, note or task directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolContext {
    /// Resolved workspace id
    pub workspace_id: String,

    /// Caller's OAuth token; reserved for the HTTP transport and always `None` over stdio
    pub oauth_token: Option<String>,
}

impl ToolContext {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        let workspace_id = workspace_id.into();
        debug!(%workspace_id, "ToolContext::new: called");
        Self {
            workspace_id,
            oauth_token: None,
        }
    }

    /// Context for tools that need no workspace
    pub fn without_workspace() -> Self {
        Self::default()
    }

    pub fn has_workspace(&self) -> bool {
        !self.workspace_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_with_workspace() {
        let ctx = ToolContext::new("ws1");
        assert_eq!(ctx.workspace_id, "ws1");
        assert!(ctx.has_workspace());
        assert!(ctx.oauth_token.is_none());
    }

    #[test]
    fn test_context_without_workspace() {
        let ctx = ToolContext::without_workspace();
        assert!(!ctx.has_workspace());
    }
}
