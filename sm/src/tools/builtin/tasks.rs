//! Task tools: create, update, list

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value, json};
use tracing::info;

use crate::api::{ApiClient, ApiRequest, validate_id};
use crate::schema::ValidatedArgs;
use crate::tools::{ToolContext, ToolError, ToolHandler, ToolName};

/// New task; `workspaceId` in the arguments is ignored in favor of the context
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskInput {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reminder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contact_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskInput {
    #[serde(skip_serializing)]
    task_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reminder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

/// Paging is forwarded as given, so `2` stays `2` and `2.5` stays `2.5`
#[derive(Debug, Deserialize)]
struct TaskPageInput {
    page: Number,
    limit: Number,
}

pub struct CreateTaskTool {
    client: Arc<dyn ApiClient>,
}

impl CreateTaskTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for CreateTaskTool {
    fn name(&self) -> ToolName {
        ToolName::CreateTask
    }

    fn description(&self) -> &'static str {
        "Create a new task in a SwipeOne workspace. Tasks can be assigned to users, linked to contacts, and \
         include due dates and reminders for tracking follow-ups and action items."
    }

    async fn execute(&self, args: ValidatedArgs, ctx: ToolContext) -> Result<Value, ToolError> {
        let ws = validate_id(&ctx.workspace_id, "workspace ID")?;
        let input: CreateTaskInput = args.deserialize()?;
        info!(
            workspace_id = %ws,
            name_len = input.name.len(),
            has_assigned_to = input.assigned_to.is_some(),
            has_due_date = input.due_date.is_some(),
            has_reminder = input.reminder.is_some(),
            has_contact_id = input.contact_id.is_some(),
            "Creating task"
        );

        let body = serde_json::to_value(&input)?;
        let response = self
            .client
            .request(ApiRequest::post(format!("/workspaces/{ws}/tasks"), body))
            .await?;

        let task_id = response
            .pointer("/data/task/_id")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(workspace_id = %ws, %task_id, "Created task");
        Ok(response)
    }
}

pub struct UpdateTaskTool {
    client: Arc<dyn ApiClient>,
}

impl UpdateTaskTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for UpdateTaskTool {
    fn name(&self) -> ToolName {
        ToolName::UpdateTask
    }

    fn description(&self) -> &'static str {
        "Update an existing task in SwipeOne. You can update any combination of fields including name, \
         assignedTo, dueDate, reminder, and status."
    }

    async fn execute(&self, args: ValidatedArgs, _ctx: ToolContext) -> Result<Value, ToolError> {
        let input: UpdateTaskInput = args.deserialize()?;
        let task_id = validate_id(&input.task_id, "task ID")?;
        info!(%task_id, status = ?input.status, "Updating task");

        let body = serde_json::to_value(&input)?;
        let response = self
            .client
            .request(ApiRequest::patch(format!("/tasks/{task_id}"), body))
            .await?;

        info!(%task_id, "Updated task");
        Ok(response)
    }
}

pub struct RetrieveAllTasksTool {
    client: Arc<dyn ApiClient>,
}

impl RetrieveAllTasksTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for RetrieveAllTasksTool {
    fn name(&self) -> ToolName {
        ToolName::RetrieveAllTasks
    }

    fn description(&self) -> &'static str {
        "Retrieve all tasks from a SwipeOne workspace with pagination support. Returns task details including \
         status, assignments, due dates, and associated contacts."
    }

    async fn execute(&self, args: ValidatedArgs, ctx: ToolContext) -> Result<Value, ToolError> {
        let ws = validate_id(&ctx.workspace_id, "workspace ID")?;
        let input: TaskPageInput = args.deserialize()?;
        info!(workspace_id = %ws, page = %input.page, limit = %input.limit, "Retrieving tasks");

        let request = ApiRequest::get(format!("/workspaces/{ws}/tasks"))
            .with_query_object(&json!({ "page": input.page, "limit": input.limit }));
        let response = self.client.request(request).await?;

        let returned = response
            .pointer("/data/tasks")
            .and_then(Value::as_array)
            .map(Vec::len);
        info!(workspace_id = %ws, ?returned, "Retrieved tasks");
        Ok(response)
    }
}
