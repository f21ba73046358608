//! MCP Protocol Compliance Tests
//!
//! JSON-RPC framing, lifecycle methods and tool dispatch over the stdio service.

use pretty_assertions::assert_eq;
use rstest::*;
use serde_json::{json, Value};
use shopify_mcp_rust::mock::MockShopify;
use shopify_mcp_rust::server::service::{
    JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PROTOCOL_VERSION,
};
use shopify_mcp_rust::server::McpServer;
use shopify_mcp_rust::tools::{ToolContext, ToolRegistry};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[fixture]
fn server() -> McpServer {
    let mock = Arc::new(MockShopify::with_fixtures());
    McpServer::new(ToolRegistry::with_all_tools(ToolContext::new(mock)))
}

async fn request(server: &McpServer, message: Value) -> JsonRpcResponse {
    server
        .handle_message(&message.to_string())
        .await
        .expect("request should be answered")
}

#[rstest]
#[tokio::test]
async fn test_initialize(server: McpServer) {
    let response = request(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "1.0" }
            }
        }),
    )
    .await;

    let result = response.result.unwrap();
    assert_eq!(response.jsonrpc, "2.0");
    assert_eq!(response.id, json!(1));
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert!(result["capabilities"]["tools"].is_object());
    assert_eq!(result["serverInfo"]["name"], "shopify-mcp-server");
}

#[rstest]
#[tokio::test]
async fn test_ping(server: McpServer) {
    let response = request(&server, json!({ "jsonrpc": "2.0", "id": "p1", "method": "ping" })).await;
    assert_eq!(response.id, json!("p1"));
    assert_eq!(response.result, Some(json!({})));
}

#[rstest]
#[tokio::test]
async fn test_tools_list(server: McpServer) {
    let response = request(&server, json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" })).await;

    let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
    assert_eq!(tools.len(), 17);

    let create = tools
        .iter()
        .find(|t| t["name"] == "create-discount")
        .expect("create-discount listed");
    let required: Vec<&str> = create["inputSchema"]["required"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    for field in ["title", "code", "startsAt", "valueType", "value"] {
        assert!(required.contains(&field), "{field} should be required");
    }
}

#[rstest]
#[tokio::test]
async fn test_tools_call_success_and_failure(server: McpServer) {
    let ok = request(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "get-order", "arguments": { "orderId": "1" } }
        }),
    )
    .await;
    let result = ok.result.unwrap();
    assert!(result.get("isError").is_none());
    assert_eq!(result["content"][0]["type"], "text");

    let missing = request(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "get-order", "arguments": { "orderId": "404" } }
        }),
    )
    .await;
    let result = missing.result.expect("tool failures are results, not RPC errors");
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("Failed to fetch order: "));
}

#[rstest]
#[tokio::test]
async fn test_unknown_tool_is_failure_result(server: McpServer) {
    let response = request(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": { "name": "no-such-tool" }
        }),
    )
    .await;

    assert!(response.error.is_none());
    assert_eq!(response.result.unwrap()["isError"], true);
}

#[rstest]
#[case(json!({ "jsonrpc": "2.0", "id": 6, "method": "tools/call" }), INVALID_PARAMS)]
#[case(json!({ "jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": { "arguments": {} } }), INVALID_PARAMS)]
#[case(json!({ "jsonrpc": "2.0", "id": 8, "method": "prompts/list" }), METHOD_NOT_FOUND)]
#[case(json!({ "jsonrpc": "2.0", "id": 9 }), INVALID_REQUEST)]
#[case(json!({ "jsonrpc": "2.0", "id": null, "method": "ping" }), INVALID_REQUEST)]
#[tokio::test]
async fn test_protocol_errors(server: McpServer, #[case] message: Value, #[case] code: i32) {
    let expected_id = message["id"].clone();
    let response = request(&server, message).await;

    assert_eq!(response.id, expected_id);
    assert!(response.result.is_none());
    assert_eq!(response.error.unwrap().code, code);
}

#[rstest]
#[tokio::test]
async fn test_serve_over_duplex_stream(server: McpServer) {
    let (client, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let (client_read, mut client_write) = tokio::io::split(client);

    let serve = tokio::spawn(async move { server.serve(server_read, server_write).await });

    client_write
        .write_all(
            concat!(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
                "\n",
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                "\n",
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"get-shop","arguments":{}}}"#,
                "\n"
            )
            .as_bytes(),
        )
        .await
        .unwrap();
    client_write.shutdown().await.unwrap();
    drop(client_write);

    let mut lines = BufReader::new(client_read).lines();
    let first: JsonRpcResponse =
        serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    let second: JsonRpcResponse =
        serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();

    assert_eq!(first.id, json!(1));
    assert_eq!(second.id, json!(2));
    assert!(second.result.unwrap()["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Mock Store"));

    serve.await.unwrap().unwrap();
}
