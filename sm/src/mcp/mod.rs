//! Model Context Protocol surface
//!
//! - `protocol` - JSON-RPC 2.0 and MCP message types
//! - `server` - newline-delimited stdio server routing into the dispatcher

pub mod protocol;
mod server;

pub use server::McpServer;
