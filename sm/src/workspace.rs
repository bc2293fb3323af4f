//! Workspace id resolution for workspace-scoped tools

use thiserror::Error;
use tracing::debug;

/// No workspace id was supplied and no default is configured
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "workspaceId is required. Either provide it as a parameter or set DEFAULT_WORKSPACE_ID in your environment."
)]
pub struct ResolutionError;

/// Picks the effective workspace id: explicit argument first, then the configured default
#[derive(Debug, Clone, Default)]
pub struct WorkspaceResolver {
    default_id: Option<String>,
}

impl WorkspaceResolver {
    pub fn new(default_id: Option<String>) -> Self {
        let default_id = default_id.filter(|id| !id.is_empty());
        debug!(has_default = default_id.is_some(), "WorkspaceResolver::new: called");
        Self { default_id }
    }

    pub fn default_id(&self) -> Option<&str> {
        self.default_id.as_deref()
    }

    pub fn resolve(&self, explicit: Option<&str>) -> Result<String, ResolutionError> {
        match explicit.filter(|id| !id.is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => self.default_id.clone().ok_or(ResolutionError),
        }
    }
}
