//! SwipeOne MCP Server
//!
//! Exposes the SwipeOne CRM REST API (contacts, notes, tasks) as tools over
//! the Model Context Protocol. Every tool call runs through one fixed
//! pipeline before any request reaches the CRM:
//!
//! ```text
//! tools/call -> rate limit -> handler lookup -> schema lookup -> validate
//!            -> resolve workspace -> handler -> CallToolResult
//! ```
//!
//! # Modules
//!
//! - [`ratelimit`] - per-tool token buckets
//! - [`schema`] - declarative argument validation and JSON Schema rendering
//! - [`workspace`] - workspace id fallback
//! - [`response`] - `CallToolResult` envelopes
//! - [`dispatch`] - the pipeline itself
//! - [`tools`] - handler trait, registry and the built-in CRM tools
//! - [`api`] - HTTP client for the CRM
//! - [`mcp`] - JSON-RPC stdio server
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod mcp;
pub mod prompts;
pub mod ratelimit;
pub mod redact;
pub mod response;
pub mod schema;
pub mod tools;
pub mod workspace;

pub use config::Config;
pub use dispatch::{DispatchError, Dispatcher};
pub use ratelimit::{LimitDecision, RateLimitConfig, RateLimiter};
pub use response::CallToolResult;
pub use tools::{ToolContext, ToolError, ToolHandler, ToolName};
