//! ToolName - the closed set of tools this server exposes

use std::fmt;
use std::str::FromStr;

/// Every tool the server knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolName {
    GetContactProperties,
    SearchContacts,
    RetrieveAllContacts,
    CreateNote,
    RetrieveNotes,
    UpdateNote,
    CreateTask,
    UpdateTask,
    RetrieveAllTasks,
}

impl ToolName {
    pub const ALL: [ToolName; 9] = [
        ToolName::GetContactProperties,
        ToolName::SearchContacts,
        ToolName::RetrieveAllContacts,
        ToolName::CreateNote,
        ToolName::RetrieveNotes,
        ToolName::UpdateNote,
        ToolName::CreateTask,
        ToolName::UpdateTask,
        ToolName::RetrieveAllTasks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetContactProperties => "get_contact_properties",
            ToolName::SearchContacts => "search_contacts",
            ToolName::RetrieveAllContacts => "retrieve_all_contacts",
            ToolName::CreateNote => "create_note",
            ToolName::RetrieveNotes => "retrieve_notes",
            ToolName::UpdateNote => "update_note",
            ToolName::CreateTask => "create_task",
            ToolName::UpdateTask => "update_task",
            ToolName::RetrieveAllTasks => "retrieve_all_tasks",
        }
    }

    /// Whether the tool needs a resolved workspace id
    ///
    /// Note and task-update tools address a contact, note or task directly.
    /// Keep this list in step with new tools.
    pub fn requires_workspace(&self) -> bool {
        !matches!(
            self,
            ToolName::CreateNote | ToolName::RetrieveNotes | ToolName::UpdateNote | ToolName::UpdateTask
        )
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known tool
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownToolName(pub String);

impl FromStr for ToolName {
    type Err = UnknownToolName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| UnknownToolName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
    }

    #[test]
    fn test_unknown_name() {
        let err = "delete_everything".parse::<ToolName>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: delete_everything");
    }

    #[test]
    fn test_workspace_exempt_set() {
        let exempt: Vec<_> = ToolName::ALL.into_iter().filter(|t| !t.requires_workspace()).collect();
        assert_eq!(
            exempt,
            vec![
                ToolName::CreateNote,
                ToolName::RetrieveNotes,
                ToolName::UpdateNote,
                ToolName::UpdateTask
            ]
        );
    }
}
