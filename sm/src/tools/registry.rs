//! ToolRegistry - the static tool name to handler map

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::ToolHandler;
use super::ToolName;
use super::builtin::{
    CreateNoteTool, CreateTaskTool, GetContactPropertiesTool, RetrieveAllContactsTool, RetrieveAllTasksTool,
    RetrieveNotesTool, SearchContactsTool, UpdateNoteTool, UpdateTaskTool,
};
use crate::api::ApiClient;
use crate::schema::schema_for;

/// Tool entry advertised in `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Handlers keyed by tool, built once at startup
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<ToolName, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Registry with every SwipeOne tool wired to `client`
    pub fn standard(client: Arc<dyn ApiClient>) -> Self {
        debug!("ToolRegistry::standard: called");
        let mut registry = Self::empty();

        // Contacts
        registry.add(Arc::new(GetContactPropertiesTool::new(client.clone())));
        registry.add(Arc::new(SearchContactsTool::new(client.clone())));
        registry.add(Arc::new(RetrieveAllContactsTool::new(client.clone())));

        // Notes
        registry.add(Arc::new(CreateNoteTool::new(client.clone())));
        registry.add(Arc::new(RetrieveNotesTool::new(client.clone())));
        registry.add(Arc::new(UpdateNoteTool::new(client.clone())));

        // Tasks
        registry.add(Arc::new(CreateTaskTool::new(client.clone())));
        registry.add(Arc::new(UpdateTaskTool::new(client.clone())));
        registry.add(Arc::new(RetrieveAllTasksTool::new(client)));

        registry
    }

    /// Create an empty registry (for testing)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a handler under its own name, replacing any previous one
    pub fn add(&mut self, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    pub fn get(&self, tool: ToolName) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(&tool).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Definitions for every registered tool, in declaration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolName::ALL
            .into_iter()
            .filter_map(|tool| self.handlers.get(&tool))
            .map(|handler| ToolDefinition {
                name: handler.name().to_string(),
                description: handler.description().to_string(),
                input_schema: schema_for(handler.name()).json_schema(),
            })
            .collect()
    }
}
