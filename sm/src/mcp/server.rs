//! MCP server - exposes the SwipeOne tools over stdio
//!
//! Reads newline-delimited JSON-RPC from the client and writes one response
//! line per request. Each `tools/call` runs as its own task so a slow CRM
//! call does not hold up other requests; responses may therefore arrive out
//! of order, matched by `id`.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::protocol::*;
use crate::dispatch::Dispatcher;
use crate::prompts;

type SharedWriter<W> = Arc<Mutex<BufWriter<W>>>;

/// The MCP server state.
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Serve on the process's stdin and stdout until the client disconnects
    pub async fn run_stdio(&self) -> std::io::Result<()> {
        info!("SwipeOne MCP Server running on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve on an arbitrary line-oriented stream pair
    ///
    /// Returns on EOF after every in-flight tool call has answered.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let writer: SharedWriter<W> = Arc::new(Mutex::new(BufWriter::new(writer)));
        let mut in_flight = JoinSet::new();
        let mut lines = reader.lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("MCP server: client disconnected (EOF)");
                    break;
                }
                Err(e) => {
                    error!("MCP server: stdin read error: {e}");
                    break;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match parse_incoming(trimmed) {
                Ok(IncomingMessage::Request(req)) if req.method == "tools/call" => {
                    let dispatcher = self.dispatcher.clone();
                    let writer = writer.clone();
                    in_flight.spawn(async move {
                        let response = handle_request(&dispatcher, req).await;
                        write_response(&writer, &response).await;
                    });
                }
                Ok(IncomingMessage::Request(req)) => {
                    let response = handle_request(&self.dispatcher, req).await;
                    write_response(&writer, &response).await;
                }
                Ok(IncomingMessage::Notification(notif)) => handle_notification(&notif),
                Err(IncomingError::Parse(e)) => {
                    warn!("MCP server: failed to parse message: {e}");
                    let response = JsonRpcResponse::error(
                        Value::Null,
                        error_codes::PARSE_ERROR,
                        format!("Parse error: {e}"),
                    );
                    write_response(&writer, &response).await;
                }
                Err(IncomingError::Invalid { id, source }) => {
                    warn!(%id, "MCP server: invalid request: {source}");
                    let response =
                        JsonRpcResponse::error(id, error_codes::INVALID_REQUEST, format!("Invalid Request: {source}"));
                    write_response(&writer, &response).await;
                }
            }

            // Reap finished calls so the set does not grow without bound
            while in_flight.try_join_next().is_some() {}
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("MCP server: tool call task failed: {e}");
            }
        }

        writer.lock().await.flush().await
    }
}

/// Handle a JSON-RPC request and return a response.
async fn handle_request(dispatcher: &Dispatcher, req: JsonRpcRequest) -> JsonRpcResponse {
    debug!(method = %req.method, id = %req.id, "handle_request: called");
    match req.method.as_str() {
        "initialize" => handle_initialize(req),
        "ping" => JsonRpcResponse::success(req.id, json!({})),
        "tools/list" => {
            let tools = dispatcher.definitions();
            debug!(count = tools.len(), "Listing tools");
            JsonRpcResponse::success(req.id, json!({ "tools": tools }))
        }
        "tools/call" => handle_tools_call(dispatcher, req).await,
        "prompts/list" => JsonRpcResponse::success(req.id, json!({ "prompts": prompts::list() })),
        "prompts/get" => handle_prompts_get(req),
        _ => JsonRpcResponse::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    }
}

/// Handle `initialize`
///
/// Echoes the client's protocol version when it is one we support, and
/// answers with our latest otherwise.
fn handle_initialize(req: JsonRpcRequest) -> JsonRpcResponse {
    let requested = req
        .params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);

    let protocol_version = match requested {
        Some(version) if SUPPORTED_PROTOCOL_VERSIONS.contains(&version) => version,
        Some(version) => {
            warn!(
                requested = version,
                answered = MCP_PROTOCOL_VERSION,
                "MCP server: client requested an unsupported protocol version"
            );
            MCP_PROTOCOL_VERSION
        }
        None => MCP_PROTOCOL_VERSION,
    }
    .to_string();
    info!(%protocol_version, "MCP server: initialize");

    let result = InitializeResult {
        protocol_version,
        capabilities: ServerCapabilities::default(),
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    JsonRpcResponse::success(req.id, serde_json::to_value(result).unwrap_or(Value::Null))
}

async fn handle_tools_call(dispatcher: &Dispatcher, req: JsonRpcRequest) -> JsonRpcResponse {
    let params: CallToolParams = match req.params.map(serde_json::from_value) {
        Some(Ok(params)) => params,
        Some(Err(e)) => {
            return JsonRpcResponse::error(req.id, error_codes::INVALID_PARAMS, format!("Invalid params: {e}"));
        }
        None => return JsonRpcResponse::error(req.id, error_codes::INVALID_PARAMS, "Missing params"),
    };

    let result = dispatcher.dispatch(&params.name, params.arguments.as_ref()).await;
    JsonRpcResponse::success(req.id, serde_json::to_value(result).unwrap_or(Value::Null))
}

fn handle_prompts_get(req: JsonRpcRequest) -> JsonRpcResponse {
    let params: GetPromptParams = match req.params.map(serde_json::from_value) {
        Some(Ok(params)) => params,
        _ => return JsonRpcResponse::error(req.id, error_codes::INVALID_PARAMS, "Missing prompt name"),
    };

    match prompts::get(&params.name) {
        Some(prompt) => JsonRpcResponse::success(req.id, serde_json::to_value(prompt).unwrap_or(Value::Null)),
        None => JsonRpcResponse::error(
            req.id,
            error_codes::INVALID_PARAMS,
            format!("Unknown prompt: {}", params.name),
        ),
    }
}

/// Handle a notification (no response needed).
fn handle_notification(notif: &JsonRpcNotification) {
    match notif.method.as_str() {
        "notifications/initialized" => info!("MCP server: client completed initialization"),
        "notifications/cancelled" => debug!("MCP server: client cancelled a request"),
        other => debug!("MCP server: unhandled notification: {other}"),
    }
}

/// Write one response line; the lock keeps lines from interleaving
async fn write_response<W: AsyncWrite + Unpin>(writer: &SharedWriter<W>, response: &JsonRpcResponse) {
    let json = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            error!("MCP server: failed to serialize response: {e}");
            return;
        }
    };

    let mut writer = writer.lock().await;
    let written = async {
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    }
    .await;
    if let Err(e) = written {
        error!("MCP server: failed to write response: {e}");
    }
}

/// An incoming message from the MCP client.
enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
}

/// Why an incoming line could not be handled.
#[derive(Debug)]
enum IncomingError {
    /// Not JSON at all.
    Parse(serde_json::Error),
    /// JSON, but not a request or notification; `id` is echoed when present.
    Invalid { id: Value, source: serde_json::Error },
}

/// Parse a JSON line into a request or notification.
fn parse_incoming(line: &str) -> Result<IncomingMessage, IncomingError> {
    let raw: Value = serde_json::from_str(line).map_err(IncomingError::Parse)?;

    let id = raw.get("id").cloned().unwrap_or(Value::Null);
    if id.is_null() {
        serde_json::from_value(raw)
            .map(IncomingMessage::Notification)
            .map_err(|source| IncomingError::Invalid { id, source })
    } else {
        serde_json::from_value(raw)
            .map(IncomingMessage::Request)
            .map_err(|source| IncomingError::Invalid { id, source })
    }
}
