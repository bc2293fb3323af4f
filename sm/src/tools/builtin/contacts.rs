//! Contact tools: properties, search, listing

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::api::{ApiClient, ApiRequest, validate_id};
use crate::schema::ValidatedArgs;
use crate::tools::{ToolContext, ToolError, ToolHandler, ToolName};

/// Arguments minus `workspaceId`, which travels in the path instead
fn without_workspace(args: &ValidatedArgs) -> Map<String, Value> {
    let mut map = args.as_map().clone();
    map.remove("workspaceId");
    map
}

fn count_of(response: &Value) -> Option<u64> {
    response.pointer("/data/count").and_then(Value::as_u64)
}

/// Lists the contact properties (fields) of a workspace
pub struct GetContactPropertiesTool {
    client: Arc<dyn ApiClient>,
}

impl GetContactPropertiesTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetContactPropertiesTool {
    fn name(&self) -> ToolName {
        ToolName::GetContactProperties
    }

    fn description(&self) -> &'static str {
        "Retrieves all contact properties (fields) available in a SwipeOne workspace. Use this to discover what \
         properties you can filter and sort by when searching contacts."
    }

    async fn execute(&self, _args: ValidatedArgs, ctx: ToolContext) -> Result<Value, ToolError> {
        info!(workspace_id = %ctx.workspace_id, "Fetching contact properties");
        let ws = validate_id(&ctx.workspace_id, "workspace ID")?;

        let response = self
            .client
            .request(ApiRequest::get(format!("/workspaces/{ws}/contact-properties")))
            .await?;

        info!(workspace_id = %ws, "Fetched contact properties");
        Ok(response)
    }
}

/// Filtered, sorted, cursor-paginated contact search
pub struct SearchContactsTool {
    client: Arc<dyn ApiClient>,
}

impl SearchContactsTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for SearchContactsTool {
    fn name(&self) -> ToolName {
        ToolName::SearchContacts
    }

    fn description(&self) -> &'static str {
        "Search and filter contacts in a SwipeOne workspace. Supports complex filtering with AND/OR logic, sorting \
         by multiple properties, and cursor-based pagination."
    }

    async fn execute(&self, args: ValidatedArgs, ctx: ToolContext) -> Result<Value, ToolError> {
        let ws = validate_id(&ctx.workspace_id, "workspace ID")?;
        let body = without_workspace(&args);
        info!(
            workspace_id = %ws,
            has_filter = body.contains_key("filter"),
            limit = ?body.get("limit"),
            "Searching contacts"
        );

        let response = self
            .client
            .request(ApiRequest::post(
                format!("/workspaces/{ws}/contacts/search"),
                Value::Object(body),
            ))
            .await?;

        info!(workspace_id = %ws, count = ?count_of(&response), "Searched contacts");
        Ok(response)
    }
}

/// Plain contact listing with text search
pub struct RetrieveAllContactsTool {
    client: Arc<dyn ApiClient>,
}

impl RetrieveAllContactsTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for RetrieveAllContactsTool {
    fn name(&self) -> ToolName {
        ToolName::RetrieveAllContacts
    }

    fn description(&self) -> &'static str {
        "Retrieve all contacts from a SwipeOne workspace. Supports text search, sorting, and cursor-based \
         pagination. Simpler alternative to search_contacts for basic retrieval."
    }

    async fn execute(&self, args: ValidatedArgs, ctx: ToolContext) -> Result<Value, ToolError> {
        let ws = validate_id(&ctx.workspace_id, "workspace ID")?;
        let params = Value::Object(without_workspace(&args));
        debug!(%params, "RetrieveAllContactsTool::execute: query");
        info!(
            workspace_id = %ws,
            has_search_text = params.get("searchText").is_some(),
            "Retrieving all contacts"
        );

        let request = ApiRequest::get(format!("/workspaces/{ws}/contacts")).with_query_object(&params);
        let response = self.client.request(request).await?;

        info!(workspace_id = %ws, count = ?count_of(&response), "Retrieved contacts");
        Ok(response)
    }
}
