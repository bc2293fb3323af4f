//! SwipeOne MCP server
//!
//! CLI entry point: serves MCP over stdio, or inspects tools and configuration.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use eyre::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use swipeone_mcp::api::{ApiClient, ApiError, ApiRequest, SwipeOneClient};
use swipeone_mcp::cli::{Cli, Command};
use swipeone_mcp::config::Config;
use swipeone_mcp::dispatch::Dispatcher;
use swipeone_mcp::mcp::McpServer;
use swipeone_mcp::ratelimit::RateLimiter;
use swipeone_mcp::schema::SchemaRegistry;
use swipeone_mcp::tools::ToolRegistry;
use swipeone_mcp::workspace::WorkspaceResolver;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // stdout carries the protocol, so logs go to a file
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("swipeone-mcp")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config/env LOG_LEVEL > INFO
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN" | "WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("swipeone-mcp.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => cmd_serve(&config).await,
        Command::Tools => cmd_tools(),
        Command::CheckConfig => cmd_check_config(&config),
    }
}

async fn cmd_serve(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    info!(
        base_url = %config.api.base_url,
        timeout_ms = config.api.timeout_ms,
        rate_limiting = config.rate_limit.enabled,
        has_default_workspace = config.workspace.default_id.is_some(),
        "Initializing SwipeOne MCP Server"
    );

    let client: Arc<dyn ApiClient> =
        Arc::new(SwipeOneClient::from_config(&config.api).context("Failed to create API client")?);

    let dispatcher = Dispatcher::new(
        Arc::new(RateLimiter::new(config.rate_limit.enabled)),
        ToolRegistry::standard(client),
        SchemaRegistry::standard(),
        WorkspaceResolver::new(config.workspace.default_id.clone()),
    );

    McpServer::new(Arc::new(dispatcher))
        .run_stdio()
        .await
        .context("MCP server failed")?;

    info!("SwipeOne MCP Server stopped");
    Ok(())
}

/// Stand-in client for commands that only inspect tool metadata
struct Offline;

#[async_trait]
impl ApiClient for Offline {
    async fn request(&self, _request: ApiRequest) -> Result<Value, ApiError> {
        Err(ApiError::Request("offline".to_string()))
    }
}

fn cmd_tools() -> Result<()> {
    let definitions = ToolRegistry::standard(Arc::new(Offline)).definitions();
    let json = serde_json::to_string_pretty(&definitions).context("Failed to serialize tool definitions")?;
    println!("{json}");
    Ok(())
}

fn cmd_check_config(config: &Config) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    println!("Configuration OK");
    println!("  base URL:          {}", config.api.base_url);
    println!("  timeout:           {} ms", config.api.timeout_ms);
    println!(
        "  default workspace: {}",
        config.workspace.default_id.as_deref().unwrap_or("(none)")
    );
    println!(
        "  rate limiting:     {}",
        if config.rate_limit.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
