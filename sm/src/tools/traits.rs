//! ToolHandler trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::{ToolContext, ToolError, ToolName};
use crate::schema::ValidatedArgs;

/// Performs one tool's side effect against the CRM
///
/// Handlers only ever see arguments that passed the tool's schema, and a
/// context whose workspace has already been resolved.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool this handler serves
    fn name(&self) -> ToolName;

    /// Human-readable description advertised in `tools/list`
    fn description(&self) -> &'static str;

    /// Execute the tool, returning the upstream payload
    async fn execute(&self, args: ValidatedArgs, ctx: ToolContext) -> Result<Value, ToolError>;
}
