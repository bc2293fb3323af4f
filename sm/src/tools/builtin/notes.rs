//! Note tools: create, list, update

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::api::{ApiClient, ApiRequest, validate_id};
use crate::schema::ValidatedArgs;
use crate::tools::{ToolContext, ToolError, ToolHandler, ToolName};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateNoteInput {
    contact_id: String,
    title: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactNotesInput {
    contact_id: String,
}

/// Fields of a note update; absent fields are left untouched upstream
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNoteInput {
    #[serde(skip_serializing)]
    note_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

pub struct CreateNoteTool {
    client: Arc<dyn ApiClient>,
}

impl CreateNoteTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for CreateNoteTool {
    fn name(&self) -> ToolName {
        ToolName::CreateNote
    }

    fn description(&self) -> &'static str {
        "Create a new note for a specific contact in SwipeOne. Notes can be used to track interactions, \
         follow-ups, or any other important information about a contact."
    }

    async fn execute(&self, args: ValidatedArgs, _ctx: ToolContext) -> Result<Value, ToolError> {
        let input: CreateNoteInput = args.deserialize()?;
        let contact_id = validate_id(&input.contact_id, "contact ID")?;
        info!(
            %contact_id,
            title_len = input.title.len(),
            content_len = input.content.len(),
            "Creating note"
        );

        let body = serde_json::json!({ "title": input.title, "content": input.content });
        let response = self
            .client
            .request(ApiRequest::post(format!("/contacts/{contact_id}/notes"), body))
            .await?;

        info!(%contact_id, "Created note");
        Ok(response)
    }
}

pub struct RetrieveNotesTool {
    client: Arc<dyn ApiClient>,
}

impl RetrieveNotesTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for RetrieveNotesTool {
    fn name(&self) -> ToolName {
        ToolName::RetrieveNotes
    }

    fn description(&self) -> &'static str {
        "Retrieve all notes associated with a specific contact in SwipeOne. Returns a list of all notes including \
         their titles, content, and creation timestamps."
    }

    async fn execute(&self, args: ValidatedArgs, _ctx: ToolContext) -> Result<Value, ToolError> {
        let input: ContactNotesInput = args.deserialize()?;
        let contact_id = validate_id(&input.contact_id, "contact ID")?;
        info!(%contact_id, "Retrieving notes");

        let response = self
            .client
            .request(ApiRequest::get(format!("/contacts/{contact_id}/notes")))
            .await?;

        let count = response
            .pointer("/data/notes")
            .and_then(Value::as_array)
            .map(Vec::len);
        info!(%contact_id, ?count, "Retrieved notes");
        Ok(response)
    }
}

pub struct UpdateNoteTool {
    client: Arc<dyn ApiClient>,
}

impl UpdateNoteTool {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for UpdateNoteTool {
    fn name(&self) -> ToolName {
        ToolName::UpdateNote
    }

    fn description(&self) -> &'static str {
        "Update an existing note in SwipeOne. You can update the title, content, or both."
    }

    async fn execute(&self, args: ValidatedArgs, _ctx: ToolContext) -> Result<Value, ToolError> {
        let input: UpdateNoteInput = args.deserialize()?;
        let note_id = validate_id(&input.note_id, "note ID")?;
        info!(
            %note_id,
            has_title = input.title.is_some(),
            has_content = input.content.is_some(),
            "Updating note"
        );

        let body = serde_json::to_value(&input)?;
        let response = self
            .client
            .request(ApiRequest::patch(format!("/notes/{note_id}"), body))
            .await?;

        info!(%note_id, "Updated note");
        Ok(response)
    }
}
