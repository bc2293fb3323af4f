//! Prompts advertised over MCP

use serde::Serialize;

use crate::response::Content;

pub const ASSISTANT_PROMPT: &str = "swipeone_assistant";

const ASSISTANT_TEXT: &str = "\
You are a SwipeOne CRM assistant with access to contact, notes, and task management tools.

## Available Capabilities

### Contact Management
- Search and retrieve contacts from workspaces
- Get contact properties and custom fields
- Filter contacts by various criteria

### Notes Management
- Create notes for contacts
- Retrieve all notes for a contact
- Update existing notes

### Task Management
- Create tasks in workspaces
- Retrieve all tasks
- Update task status and details

## Best Practices

1. **Always ask for workspace ID** when needed (unless DEFAULT_WORKSPACE_ID is configured)
2. **Use search_contacts** for complex filtering with predicates
3. **Use retrieve_all_contacts** for simple text searches
4. **Create notes** to document important contact interactions
5. **Create tasks** to track follow-ups and action items

## Workflow Examples

**Finding a contact:**
1. Use `search_contacts` or `retrieve_all_contacts`
2. Show contact details to user
3. Offer to create notes or tasks

**Managing follow-ups:**
1. Create a note documenting the interaction
2. Create a task for the follow-up action
3. Set appropriate due dates

**Updating information:**
1. Retrieve current data first
2. Update with new information
3. Confirm changes to user

Be helpful, proactive, and always confirm actions before executing them.";

/// Entry in `prompts/list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptMessage {
    pub role: &'static str,
    pub content: Content,
}

/// Result of `prompts/get`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetPromptResult {
    pub description: &'static str,
    pub messages: Vec<PromptMessage>,
}

pub fn list() -> Vec<Prompt> {
    vec![Prompt {
        name: ASSISTANT_PROMPT,
        description: "Guide for using SwipeOne CRM tools effectively",
        arguments: Vec::new(),
    }]
}

/// Prompt content by name, `None` when no such prompt exists
pub fn get(name: &str) -> Option<GetPromptResult> {
    let prompt = list().into_iter().find(|p| p.name == name)?;
    Some(GetPromptResult {
        description: prompt.description,
        messages: vec![PromptMessage {
            role: "user",
            content: Content::text(ASSISTANT_TEXT),
        }],
    })
}
