//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SwipeOne MCP server - CRM contacts, notes and tasks as MCP tools
#[derive(Debug, Parser)]
#[command(
    name = "swipeone-mcp",
    about = "MCP server exposing the SwipeOne CRM API over stdio",
    version,
    after_help = "Logs are written to: ~/.local/share/swipeone-mcp/logs/swipeone-mcp.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// Print the tool definitions advertised in tools/list as JSON
    Tools,

    /// Validate configuration and exit
    CheckConfig,
}
