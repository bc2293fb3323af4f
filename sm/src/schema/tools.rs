//! Argument schemas for each SwipeOne tool

use std::collections::HashMap;

use serde_json::json;
use tracing::debug;

use super::{FieldKind, FieldSpec, ToolSchema};
use crate::tools::ToolName;

const WORKSPACE_ID_DESC: &str = "The unique identifier of the workspace. Optional if DEFAULT_WORKSPACE_ID is set.";
const TASK_STATUSES: &[&str] = &["not_started", "in_progress", "completed"];

fn workspace_id() -> FieldSpec {
    FieldSpec::string("workspaceId").describe(WORKSPACE_ID_DESC)
}

fn note_title() -> FieldSpec {
    FieldSpec::string("title").min_len(1).max_len(500).trim()
}

fn note_content() -> FieldSpec {
    FieldSpec::string("content").min_len(1).max_len(10_000).trim()
}

fn task_name() -> FieldSpec {
    FieldSpec::string("name").min_len(1).max_len(500).trim()
}

fn assigned_to() -> FieldSpec {
    FieldSpec::string("assignedTo")
        .max_len(200)
        .trim()
        .describe("User id the task is assigned to")
}

fn page_limit(default: u32) -> FieldSpec {
    FieldSpec::number("limit")
        .range(1.0, 100.0)
        .default_value(json!(default))
        .describe("Maximum number of results to return (1-100)")
}

fn search_filter() -> FieldSpec {
    let predicate = FieldKind::Object(vec![
        FieldSpec::string("property")
            .required()
            .describe("Property name to filter on (e.g. \"customProperties.subscriptionStatus\")"),
        FieldSpec::string("operator")
            .required()
            .describe("Comparison operator (e.g. \"is\", \"contains\")"),
        FieldSpec::string("value").required().describe("Value to compare against"),
        FieldSpec::string("dataType")
            .required()
            .describe("Data type of the property (e.g. \"string\", \"number\")"),
    ]);

    FieldSpec::object(
        "filter",
        vec![
            FieldSpec::enumeration("type", &["and", "or"])
                .required()
                .describe("Logical operator combining the predicates"),
            FieldSpec::array("predicates", predicate)
                .required()
                .describe("Filter conditions"),
        ],
    )
    .describe("Filter criteria for contacts")
}

fn sort_options() -> FieldSpec {
    FieldSpec::array(
        "sort",
        FieldKind::Object(vec![
            FieldSpec::string("property").required().describe("Property name to sort by"),
            FieldSpec::enumeration("order", &["asc", "dsc"]).required(),
        ]),
    )
    .describe("Sort options, applied in order")
}

/// Schema declared for `tool`
pub fn schema_for(tool: ToolName) -> ToolSchema {
    let fields = match tool {
        ToolName::GetContactProperties => vec![workspace_id()],
        ToolName::SearchContacts => vec![
            workspace_id(),
            search_filter(),
            page_limit(10),
            sort_options(),
            FieldSpec::string("searchAfter").describe("Cursor for the next page of results"),
            FieldSpec::string("searchBefore").describe("Cursor for the previous page of results"),
        ],
        ToolName::RetrieveAllContacts => vec![
            workspace_id(),
            FieldSpec::string("searchText").describe("Free-text search across contact fields"),
            FieldSpec::string("sort").describe("Property to sort by"),
            FieldSpec::number("order")
                .range(-1.0, 1.0)
                .describe("Sort direction: 1 ascending, -1 descending"),
            FieldSpec::string("searchAfter").describe("Cursor for the next page of results"),
            FieldSpec::string("searchBefore").describe("Cursor for the previous page of results"),
            page_limit(20),
        ],
        ToolName::CreateNote => vec![
            FieldSpec::string("contactId")
                .required()
                .describe("Contact the note belongs to"),
            note_title().required().describe("Note title (1-500 characters)"),
            note_content()
                .required()
                .describe("Note body (1-10000 characters)"),
        ],
        ToolName::RetrieveNotes => vec![
            FieldSpec::string("contactId")
                .required()
                .describe("Contact whose notes to retrieve"),
        ],
        ToolName::UpdateNote => vec![
            FieldSpec::string("noteId").required().describe("Note to update"),
            note_title().describe("New title (1-500 characters)"),
            note_content().describe("New body (1-10000 characters)"),
        ],
        ToolName::CreateTask => vec![
            workspace_id(),
            task_name().required().describe("Task name (1-500 characters)"),
            assigned_to(),
            FieldSpec::datetime("dueDate").describe("Due date, ISO 8601 UTC"),
            FieldSpec::datetime("reminder").describe("Reminder time, ISO 8601 UTC"),
            FieldSpec::string("contactId").describe("Contact to link the task to"),
        ],
        ToolName::UpdateTask => vec![
            FieldSpec::string("taskId").required().describe("Task to update"),
            task_name().describe("New task name (1-500 characters)"),
            assigned_to(),
            FieldSpec::datetime("dueDate").describe("Due date, ISO 8601 UTC"),
            FieldSpec::datetime("reminder").describe("Reminder time, ISO 8601 UTC"),
            FieldSpec::enumeration("status", TASK_STATUSES).describe("Task status"),
        ],
        ToolName::RetrieveAllTasks => vec![
            workspace_id(),
            FieldSpec::number("page")
                .min(1.0)
                .default_value(json!(1))
                .describe("Page number, starting at 1"),
            page_limit(20),
        ],
    };

    ToolSchema::new(fields)
}

/// Schemas keyed by tool, built once at startup
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<ToolName, ToolSchema>,
}

impl SchemaRegistry {
    /// Registry with a schema for every tool
    pub fn standard() -> Self {
        debug!("SchemaRegistry::standard: called");
        let schemas = ToolName::ALL.into_iter().map(|tool| (tool, schema_for(tool))).collect();
        Self { schemas }
    }

    /// Registry with no schemas (for testing)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tool: ToolName, schema: ToolSchema) {
        self.schemas.insert(tool, schema);
    }

    pub fn get(&self, tool: ToolName) -> Option<&ToolSchema> {
        self.schemas.get(&tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldError;
    use serde_json::Value;

    fn validate(tool: ToolName, args: Value) -> Result<crate::schema::ValidatedArgs, Vec<FieldError>> {
        schema_for(tool).validate(Some(&args))
    }

    fn paths(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_every_tool_has_a_schema() {
        let registry = SchemaRegistry::standard();
        for tool in ToolName::ALL {
            assert!(registry.get(tool).is_some(), "missing schema for {tool}");
        }
        assert!(SchemaRegistry::empty().get(ToolName::CreateTask).is_none());
    }

    #[test]
    fn test_search_contacts_defaults_limit() {
        let args = validate(ToolName::SearchContacts, json!({})).unwrap();
        assert_eq!(args.get("limit"), Some(&json!(10)));
    }

    #[test]
    fn test_retrieve_all_contacts_defaults_and_order_range() {
        let args = validate(ToolName::RetrieveAllContacts, json!({"workspaceId": "ws1"})).unwrap();
        assert_eq!(args.get("limit"), Some(&json!(20)));

        let errors = validate(ToolName::RetrieveAllContacts, json!({"order": 2})).unwrap_err();
        assert_eq!(paths(&errors), vec!["order"]);
    }

    #[test]
    fn test_search_contacts_nested_errors() {
        let errors = validate(
            ToolName::SearchContacts,
            json!({
                "filter": {"type": "xor", "predicates": [{"property": "email", "operator": "is", "value": 1}]},
                "limit": 0,
                "sort": [{"property": "name", "order": "down"}]
            }),
        )
        .unwrap_err();

        assert_eq!(
            paths(&errors),
            vec![
                "filter.type",
                "filter.predicates.0.value",
                "filter.predicates.0.dataType",
                "limit",
                "sort.0.order"
            ]
        );
    }

    #[test]
    fn test_create_note_requires_all_fields() {
        let errors = validate(ToolName::CreateNote, json!({})).unwrap_err();
        assert_eq!(paths(&errors), vec!["contactId", "title", "content"]);
        assert!(errors.iter().all(|e| e.message == "Required"));
    }

    #[test]
    fn test_create_note_length_bounds() {
        let errors = validate(
            ToolName::CreateNote,
            json!({"contactId": "c1", "title": "t".repeat(501), "content": "x".repeat(10_001)}),
        )
        .unwrap_err();
        assert_eq!(paths(&errors), vec!["title", "content"]);
    }

    #[test]
    fn test_update_note_only_needs_id() {
        let args = validate(ToolName::UpdateNote, json!({"noteId": "n1"})).unwrap();
        assert_eq!(args.as_map().len(), 1);
    }

    #[test]
    fn test_create_task_valid_and_trimmed() {
        let args = validate(
            ToolName::CreateTask,
            json!({"name": "  Follow up  ", "workspaceId": "ws1", "dueDate": "2025-06-01T09:00:00Z"}),
        )
        .unwrap();
        assert_eq!(args.get_str("name"), Some("Follow up"));
        assert_eq!(args.workspace_id(), Some("ws1"));
    }

    #[test]
    fn test_create_task_rejects_bad_dates_and_long_assignee() {
        let errors = validate(
            ToolName::CreateTask,
            json!({"name": "x", "dueDate": "next week", "reminder": "2025-06-01", "assignedTo": "a".repeat(201)}),
        )
        .unwrap_err();
        assert_eq!(paths(&errors), vec!["assignedTo", "dueDate", "reminder"]);
    }

    #[test]
    fn test_update_task_status_enum() {
        assert!(validate(ToolName::UpdateTask, json!({"taskId": "t1", "status": "completed"})).is_ok());
        let errors = validate(ToolName::UpdateTask, json!({"taskId": "t1", "status": "done"})).unwrap_err();
        assert_eq!(
            errors[0].message,
            "Invalid enum value. Expected 'not_started' | 'in_progress' | 'completed', received 'done'"
        );
    }

    #[test]
    fn test_retrieve_all_tasks_defaults() {
        let args = validate(ToolName::RetrieveAllTasks, json!({})).unwrap();
        assert_eq!(args.get("page"), Some(&json!(1)));
        assert_eq!(args.get("limit"), Some(&json!(20)));

        let errors = validate(ToolName::RetrieveAllTasks, json!({"page": 0, "limit": 101})).unwrap_err();
        assert_eq!(paths(&errors), vec!["page", "limit"]);
    }

    #[test]
    fn test_paging_accepts_fractional_numbers() {
        let args = validate(ToolName::RetrieveAllTasks, json!({"page": 1.5, "limit": 2.5})).unwrap();
        assert_eq!(args.get("page"), Some(&json!(1.5)));
        assert_eq!(args.get("limit"), Some(&json!(2.5)));

        assert!(validate(ToolName::RetrieveAllContacts, json!({"order": 0.5})).is_ok());

        let schema = schema_for(ToolName::RetrieveAllTasks).json_schema();
        assert_eq!(schema["properties"]["page"]["type"], "number");
        assert_eq!(schema["properties"]["limit"]["type"], "number");
    }

    #[test]
    fn test_whitespace_title_passes_length_check() {
        let args = validate(ToolName::CreateNote, json!({"contactId": "c1", "title": "   ", "content": "body"})).unwrap();
        assert_eq!(args.get_str("title"), Some(""));
    }

    #[test]
    fn test_task_dates_need_uppercase_t_separator() {
        let errors = validate(
            ToolName::UpdateTask,
            json!({"taskId": "t1", "dueDate": "2025-01-15 10:00:00Z", "reminder": "2025-01-15t10:00:00Z"}),
        )
        .unwrap_err();
        assert_eq!(paths(&errors), vec!["dueDate", "reminder"]);
        assert!(errors.iter().all(|e| e.message == "Invalid datetime"));
    }

    #[test]
    fn test_json_schema_for_search_contacts() {
        let schema = schema_for(ToolName::SearchContacts).json_schema();
        assert_eq!(schema["properties"]["limit"]["maximum"], json!(100.0));
        assert_eq!(schema["properties"]["filter"]["required"], json!(["type", "predicates"]));
        assert_eq!(
            schema["properties"]["sort"]["items"]["properties"]["order"]["enum"],
            json!(["asc", "dsc"])
        );
        assert_eq!(schema["required"], json!([]));
    }
}
