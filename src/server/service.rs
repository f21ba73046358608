//! MCP JSON-RPC 2.0 service over newline-delimited streams
//!
//! One request per line in, one response per line out. Notifications (no
//! `id`) are processed but never answered. Tool failures travel inside the
//! `tools/call` result envelope; only protocol problems become JSON-RPC errors.

use crate::error::Result;
use crate::logging::{log_tool_call, log_tool_result};
use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// MCP server dispatching to a [`ToolRegistry`]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            name: "shopify-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw line; `None` means nothing is sent back
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse JSON-RPC message: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        // Only an absent id marks a notification; null or structured ids are rejected
        let id = match value.get("id") {
            None => Value::Null,
            Some(id @ (Value::String(_) | Value::Number(_))) => id.clone(),
            Some(other) => {
                warn!("Rejecting request with invalid id {}", other);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    INVALID_REQUEST,
                    format!("Invalid request: id must be a string or number, got {other}"),
                ));
            }
        };
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
        }
    }

    /// Handle a parsed request; notifications yield `None`
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling MCP request: {}", request.method);

        let Some(id) = request.id else {
            debug!("Notification {} acknowledged", request.method);
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.definitions() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::result(id, result),
            Err((code, message)) => JsonRpcResponse::error(id, code, message),
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": { "name": self.name, "version": self.version },
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> std::result::Result<Value, (i32, String)> {
        let params = params.ok_or_else(|| {
            (
                INVALID_PARAMS,
                "Missing parameters for tools/call".to_string(),
            )
        })?;
        let params: CallToolParams = serde_json::from_value(params)
            .map_err(|e| (INVALID_PARAMS, format!("Invalid parameters: {e}")))?;

        log_tool_call(&params.name, params.arguments.as_ref().unwrap_or(&Value::Null));
        let started = Instant::now();

        let result = self.registry.call(&params.name, params.arguments).await;

        log_tool_result(
            &params.name,
            started.elapsed().as_millis() as u64,
            result.is_error(),
        );
        serde_json::to_value(result).map_err(|e| (INVALID_PARAMS, e.to_string()))
    }

    /// Serve requests from `reader` until end of input
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                let mut encoded = serde_json::to_string(&response)?;
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("Input closed, MCP service stopping");
        Ok(())
    }

    /// Serve on the process stdin and stdout
    pub async fn serve_stdio(&self) -> Result<()> {
        info!("MCP service started on stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockShopify;
    use crate::tools::ToolContext;

    fn server() -> McpServer {
        McpServer::new(ToolRegistry::with_all_tools(ToolContext::new(Arc::new(
            MockShopify::with_fixtures(),
        ))))
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_null_id_is_not_a_notification() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, Value::Null);
        assert!(response.result.is_none());
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_structured_id_rejected() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":{"n":1},"method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, json!(7));
        assert_eq!(response.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_message("{not json").await.unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_serve_writes_one_line_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get-shop"}}"#,
            "\n"
        );
        let mut output = Vec::new();

        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: JsonRpcResponse = serde_json::from_str(lines[1]).unwrap();
        assert!(second.result.unwrap()["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Mock Store"));
    }
}
