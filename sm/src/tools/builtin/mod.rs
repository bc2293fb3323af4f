//! Built-in SwipeOne tool handlers

mod contacts;
mod notes;
mod tasks;

pub use contacts::{GetContactPropertiesTool, RetrieveAllContactsTool, SearchContactsTool};
pub use notes::{CreateNoteTool, RetrieveNotesTool, UpdateNoteTool};
pub use tasks::{CreateTaskTool, RetrieveAllTasksTool, UpdateTaskTool};
