//! Dispatcher - the fixed pipeline every tool call goes through
//!
//! Order: rate limit, handler lookup, schema lookup, validation, workspace
//! resolution, handler, formatting. Each step can short-circuit with an
//! error envelope; nothing after a failed step runs. Every outcome is a
//! [`CallToolResult`], never a protocol error.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::ratelimit::{LimitDecision, RateLimiter};
use crate::response::CallToolResult;
use crate::schema::SchemaRegistry;
use crate::tools::{ToolContext, ToolDefinition, ToolName, ToolRegistry};
use crate::workspace::WorkspaceResolver;

/// Pipeline failures that are not the caller's input or the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Internal error: No validation schema for tool {0}")]
    MissingSchema(ToolName),
}

impl DispatchError {
    pub fn to_result(&self) -> CallToolResult {
        CallToolResult::error(self.to_string(), None)
    }
}

/// Routes tool calls through the dispatch pipeline
///
/// Everything it owns is built once at startup; the dispatcher itself is
/// shared across concurrent calls.
pub struct Dispatcher {
    limiter: Arc<RateLimiter>,
    tools: ToolRegistry,
    schemas: SchemaRegistry,
    resolver: WorkspaceResolver,
}

impl Dispatcher {
    pub fn new(
        limiter: Arc<RateLimiter>,
        tools: ToolRegistry,
        schemas: SchemaRegistry,
        resolver: WorkspaceResolver,
    ) -> Self {
        debug!(tool_count = tools.len(), "Dispatcher::new: called");
        Self {
            limiter,
            tools,
            schemas,
            resolver,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Tool definitions for `tools/list`
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    /// Run one tool call through the pipeline
    pub async fn dispatch(&self, name: &str, arguments: Option<&Value>) -> CallToolResult {
        info!(tool = %name, "Tool call received");

        // 1. Rate limit, keyed by the raw name so unknown tools are limited too
        let decision = self.limiter.check_limit(name);
        if !decision.allowed {
            warn!(tool = %name, retry_after = ?decision.retry_after_secs, "Rate limit exceeded for tool");
            return rate_limited(&decision);
        }

        // 2. Handler lookup
        let Some((tool, handler)) = name.parse::<ToolName>().ok().and_then(|t| self.tools.get(t).map(|h| (t, h)))
        else {
            warn!(tool = %name, "Unknown tool requested");
            return DispatchError::UnknownTool(name.to_string()).to_result();
        };

        // 3. Schema lookup
        let Some(schema) = self.schemas.get(tool) else {
            error!(%tool, "No validation schema found for tool");
            return DispatchError::MissingSchema(tool).to_result();
        };

        // 4. Validation
        let args = match schema.validate(arguments) {
            Ok(args) => args,
            Err(errors) => {
                warn!(%tool, ?errors, "Validation failed");
                return CallToolResult::validation_error(&errors);
            }
        };

        // 5. Workspace resolution, skipped for tools that address records directly
        let ctx = if tool.requires_workspace() {
            match self.resolver.resolve(args.workspace_id()) {
                Ok(workspace_id) => {
                    debug!(%tool, %workspace_id, "Resolved workspace ID");
                    ToolContext::new(workspace_id)
                }
                Err(e) => {
                    warn!(%tool, "Failed to resolve workspace ID");
                    return CallToolResult::error(e.to_string(), None);
                }
            }
        } else {
            ToolContext::without_workspace()
        };

        // 6. Execute; a panicking handler must not take the server down
        let outcome = AssertUnwindSafe(handler.execute(args, ctx)).catch_unwind().await;

        // 7. Format
        let result = match outcome {
            Ok(Ok(payload)) => CallToolResult::success(&payload),
            Ok(Err(e)) => {
                error!(%tool, error = %e, "Tool execution failed");
                e.to_result()
            }
            Err(_) => {
                error!(%tool, "Tool handler panicked");
                CallToolResult::error("An unexpected error occurred", None)
            }
        };

        info!(%tool, is_error = result.is_error, "Tool execution completed");
        result
    }
}

fn rate_limited(decision: &LimitDecision) -> CallToolResult {
    let retry_after = decision.retry_after_secs.unwrap_or_default();
    CallToolResult::error(
        format!("Rate limit exceeded. Please try again in {retry_after} seconds."),
        Some(&json!({ "retryAfter": retry_after, "limit": decision.limit })),
    )
    .with_metadata(json!({ "retryAfterSeconds": retry_after, "limit": decision.limit }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::RateLimitConfig;
    use crate::schema::{FieldSpec, ToolSchema, ValidatedArgs};
    use crate::tools::{ToolError, ToolHandler};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every call and answers with a fixed outcome
    struct RecordingHandler {
        tool: ToolName,
        calls: AtomicUsize,
        contexts: Mutex<Vec<ToolContext>>,
        outcome: fn() -> Result<Value, ToolError>,
    }

    impl RecordingHandler {
        fn new(tool: ToolName, outcome: fn() -> Result<Value, ToolError>) -> Arc<Self> {
            Arc::new(Self {
                tool,
                calls: AtomicUsize::new(0),
                contexts: Mutex::new(Vec::new()),
                outcome,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ToolHandler for RecordingHandler {
        fn name(&self) -> ToolName {
            self.tool
        }

        fn description(&self) -> &'static str {
            "recording handler"
        }

        async fn execute(&self, _args: ValidatedArgs, ctx: ToolContext) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.contexts.lock().unwrap().push(ctx);
            (self.outcome)()
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl ToolHandler for PanickingHandler {
        fn name(&self) -> ToolName {
            ToolName::RetrieveNotes
        }

        fn description(&self) -> &'static str {
            "always panics"
        }

        async fn execute(&self, _args: ValidatedArgs, _ctx: ToolContext) -> Result<Value, ToolError> {
            panic!("handler bug");
        }
    }

    fn ok_payload() -> Result<Value, ToolError> {
        Ok(json!({"status": "success"}))
    }

    fn dispatcher_with(handler: Arc<dyn ToolHandler>, default_ws: Option<&str>) -> Dispatcher {
        let mut tools = ToolRegistry::empty();
        tools.add(handler);
        Dispatcher::new(
            Arc::new(RateLimiter::new(true)),
            tools,
            SchemaRegistry::standard(),
            WorkspaceResolver::new(default_ws.map(str::to_string)),
        )
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let handler = RecordingHandler::new(ToolName::CreateTask, ok_payload);
        let dispatcher = dispatcher_with(handler.clone(), None);

        let result = dispatcher
            .dispatch("create_task", Some(&json!({"name": "Follow up", "workspaceId": "ws1"})))
            .await;

        assert!(!result.is_error);
        assert_eq!(serde_json::from_str::<Value>(&result.text()).unwrap(), json!({"status": "success"}));
        assert_eq!(handler.calls(), 1);
        assert_eq!(handler.contexts.lock().unwrap()[0].workspace_id, "ws1");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let handler = RecordingHandler::new(ToolName::CreateTask, ok_payload);
        let dispatcher = dispatcher_with(handler, None);

        let result = dispatcher.dispatch("delete_everything", None).await;
        assert!(result.is_error);
        assert_eq!(result.text(), "Unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn test_known_name_without_handler_is_unknown() {
        let handler = RecordingHandler::new(ToolName::CreateTask, ok_payload);
        let dispatcher = dispatcher_with(handler, None);

        let result = dispatcher.dispatch("update_task", Some(&json!({"taskId": "t1"}))).await;
        assert_eq!(result.text(), "Unknown tool: update_task");
    }

    #[tokio::test]
    async fn test_missing_schema_is_internal_error() {
        let handler = RecordingHandler::new(ToolName::CreateTask, ok_payload);
        let mut tools = ToolRegistry::empty();
        tools.add(handler.clone());
        let dispatcher = Dispatcher::new(
            Arc::new(RateLimiter::new(false)),
            tools,
            SchemaRegistry::empty(),
            WorkspaceResolver::default(),
        );

        let result = dispatcher.dispatch("create_task", Some(&json!({"name": "x"}))).await;
        assert!(result.is_error);
        assert_eq!(result.text(), "Internal error: No validation schema for tool create_task");
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_skips_handler() {
        let handler = RecordingHandler::new(ToolName::CreateTask, ok_payload);
        let dispatcher = dispatcher_with(handler.clone(), Some("ws1"));

        let result = dispatcher.dispatch("create_task", Some(&json!({"name": ""}))).await;

        assert!(result.is_error);
        assert_eq!(
            result.text(),
            "Validation failed:\n- name: String must contain at least 1 character(s)"
        );
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_schema_is_used() {
        let handler = RecordingHandler::new(ToolName::RetrieveNotes, ok_payload);
        let mut tools = ToolRegistry::empty();
        tools.add(handler.clone());
        let mut schemas = SchemaRegistry::empty();
        schemas.insert(
            ToolName::RetrieveNotes,
            ToolSchema::new(vec![FieldSpec::string("contactId").max_len(2).required()]),
        );
        let dispatcher = Dispatcher::new(
            Arc::new(RateLimiter::new(false)),
            tools,
            schemas,
            WorkspaceResolver::default(),
        );

        let result = dispatcher.dispatch("retrieve_notes", Some(&json!({"contactId": "abc"}))).await;
        assert!(result.text().contains("contactId: String must contain at most 2 character(s)"));
        assert_eq!(handler.calls(), 0);
    }

    #[tokio::test]
    async fn test_workspace_falls_back_to_default() {
        let handler = RecordingHandler::new(ToolName::RetrieveAllTasks, ok_payload);
        let dispatcher = dispatcher_with(handler.clone(), Some("default_ws"));

        let result = dispatcher.dispatch("retrieve_all_tasks", None).await;

        assert!(!result.is_error);
        assert_eq!(handler.contexts.lock().unwrap()[0].workspace_id, "default_ws");
    }

    #[tokio::test]
    async fn test_exempt_tool_gets_empty_workspace() {
        let handler = RecordingHandler::new(ToolName::UpdateTask, ok_payload);
        let dispatcher = dispatcher_with(handler.clone(), None);

        let result = dispatcher.dispatch("update_task", Some(&json!({"taskId": "t1"}))).await;

        assert!(!result.is_error);
        assert_eq!(handler.contexts.lock().unwrap()[0], ToolContext::without_workspace());
    }

    #[tokio::test]
    async fn test_handler_error_becomes_envelope() {
        fn not_found() -> Result<Value, ToolError> {
            Err(ToolError::Api(crate::api::ApiError::Status {
                status: 404,
                body: json!({"message": "Task not found"}),
            }))
        }
        let handler = RecordingHandler::new(ToolName::UpdateTask, not_found);
        let dispatcher = dispatcher_with(handler, None);

        let result = dispatcher.dispatch("update_task", Some(&json!({"taskId": "missing"}))).await;

        assert!(result.is_error);
        assert!(result.text().starts_with("API Error: API request failed with status 404"));
        assert!(result.text().contains("\"statusCode\": 404"));
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let dispatcher = dispatcher_with(Arc::new(PanickingHandler), None);

        let result = dispatcher.dispatch("retrieve_notes", Some(&json!({"contactId": "c1"}))).await;

        assert!(result.is_error);
        assert_eq!(result.text(), "An unexpected error occurred");
    }

    #[tokio::test]
    async fn test_rate_limit_short_circuits_before_lookup() {
        let handler = RecordingHandler::new(ToolName::RetrieveNotes, ok_payload);
        let mut tools = ToolRegistry::empty();
        tools.add(handler.clone());
        let limiter = RateLimiter::with_limits(
            true,
            HashMap::from([("retrieve_notes".to_string(), RateLimitConfig::per_minute(2))]),
            RateLimitConfig::per_minute(10),
        );
        let dispatcher = Dispatcher::new(
            Arc::new(limiter),
            tools,
            SchemaRegistry::standard(),
            WorkspaceResolver::default(),
        );
        let args = json!({"contactId": "c1"});

        assert!(!dispatcher.dispatch("retrieve_notes", Some(&args)).await.is_error);
        assert!(!dispatcher.dispatch("retrieve_notes", Some(&args)).await.is_error);
        let denied = dispatcher.dispatch("retrieve_notes", Some(&args)).await;

        assert!(denied.is_error);
        assert!(denied.text().starts_with("Rate limit exceeded. Please try again in 60 seconds."));
        let metadata = denied.metadata.unwrap();
        assert_eq!(metadata["retryAfterSeconds"], 60);
        assert_eq!(metadata["limit"], json!({"capacity": 2, "windowMs": 60000}));
        assert_eq!(handler.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_tools_are_rate_limited_with_default() {
        let handler = RecordingHandler::new(ToolName::CreateTask, ok_payload);
        let dispatcher = dispatcher_with(handler, None);

        for _ in 0..10 {
            assert_eq!(dispatcher.dispatch("nope", None).await.text(), "Unknown tool: nope");
        }
        assert!(dispatcher.dispatch("nope", None).await.text().starts_with("Rate limit exceeded"));
    }
}
