//! MCP stdio server loop.
//!
//! Reads newline-delimited JSON-RPC requests from stdin and answers on
//! stdout, one at a time — each operation runs to completion before the
//! next request is read, which is the whole concurrency model. All
//! diagnostics go to stderr via tracing; stdout belongs to the protocol.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::tools::{ToolContext, ToolRegistry};

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, ToolCallParams, ToolCallResult, ToolListResult,
    INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};

pub struct McpServer {
    registry: ToolRegistry,
    context: ToolContext,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, context: ToolContext) -> Self {
        Self { registry, context }
    }

    /// Serves requests until stdin closes.
    pub async fn serve_stdio(&self) -> anyhow::Result<()> {
        info!("MCP server ready on stdio ({} tools)", self.registry.len());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let payload = serde_json::to_string(&response)?;
                stdout.write_all(payload.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handles one raw request line. Returns None when no response is due
    /// (notifications).
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Unparseable request: {e}");
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("parse error: {e}"),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::failure(
                request.id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "invalid json-rpc version".to_string(),
            ));
        }

        let is_notification = request.id.is_none();
        let id = request.id.clone().unwrap_or(Value::Null);
        debug!("Request: {} (id {id})", request.method);

        let response = self.dispatch(request).await;
        if is_notification {
            // Notifications never get a response, even on error
            return None;
        }
        Some(response.map_or_else(
            |e| e,
            |result| JsonRpcResponse::success(id, result),
        ))
    }

    /// Method dispatch. `Err` carries an already-built failure response.
    async fn dispatch(&self, request: JsonRpcRequest) -> Result<Value, JsonRpcResponse> {
        let id = request.id.clone().unwrap_or(Value::Null);
        match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
            "notifications/initialized" | "notifications/cancelled" => Ok(Value::Null),
            "ping" => Ok(json!({})),
            "tools/list" => {
                let result = ToolListResult {
                    tools: self.registry.definitions(),
                };
                serde_json::to_value(result).map_err(|e| {
                    JsonRpcResponse::failure(id, INVALID_REQUEST, e.to_string())
                })
            }
            "tools/call" => {
                let params = request.params.unwrap_or(Value::Null);
                let call: ToolCallParams = serde_json::from_value(params).map_err(|_| {
                    JsonRpcResponse::failure(
                        id.clone(),
                        INVALID_REQUEST,
                        "tools/call requires name and arguments".to_string(),
                    )
                })?;
                info!("tools/call: {}", call.name);
                match self
                    .registry
                    .execute(&call.name, call.arguments, &self.context)
                    .await
                {
                    Ok(value) => {
                        serde_json::to_value(ToolCallResult::from_value(&value)).map_err(|e| {
                            JsonRpcResponse::failure(id, INVALID_REQUEST, e.to_string())
                        })
                    }
                    Err(e) => {
                        warn!("Tool {} failed: {e}", call.name);
                        Err(JsonRpcResponse::tool_failure(id, &e))
                    }
                }
            }
            other => Err(JsonRpcResponse::failure(
                id,
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        }
    }
}
