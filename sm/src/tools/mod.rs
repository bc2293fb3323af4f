//! Tool system for the SwipeOne MCP server
//!
//! Each tool has a `ToolName`, a handler implementing [`ToolHandler`] and an
//! argument schema. Handlers receive validated arguments plus a
//! [`ToolContext`] carrying the resolved workspace.

mod context;
mod error;
mod name;
mod registry;
mod traits;

pub mod builtin;

pub use context::ToolContext;
pub use error::ToolError;
pub use name::{ToolName, UnknownToolName};
pub use registry::{ToolDefinition, ToolRegistry};
pub use traits::ToolHandler;
