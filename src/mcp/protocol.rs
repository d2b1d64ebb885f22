// MCP Protocol Implementation
//
// JSON-RPC 2.0 message handling for the Model Context Protocol: initialize,
// ping, tools/list and tools/call. Transport-agnostic; the stdio server and
// the HTTP interface both feed messages through `handle_message`.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::DispatchError;
use crate::tools::{Dispatcher, InvocationRequest, ToolArguments};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "acquired-mcp-server";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

/// An incoming JSON-RPC request or notification
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// Absent for notifications
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn error_response(id: Value, code: i64, message: &str, data: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message
    });
    if let Some(data) = data {
        error["data"] = data;
    }
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error
    })
}

/// Parse one raw message and produce the response to send, if any
pub async fn handle_message(dispatcher: &Dispatcher, raw: &str) -> Option<Value> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to parse JSON request: {}", e);
            return Some(error_response(Value::Null, PARSE_ERROR, "Parse error", None));
        }
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) => handle_request(dispatcher, request).await,
        Err(e) => {
            error!("Invalid JSON-RPC request: {}", e);
            Some(error_response(id, INVALID_REQUEST, "Invalid Request", None))
        }
    }
}

/// Route a parsed request. Notifications never produce a response.
pub async fn handle_request(dispatcher: &Dispatcher, request: JsonRpcRequest) -> Option<Value> {
    if request.is_notification() {
        info!("Received notification: {}", request.method);
        return None;
    }
    let id = request.id.clone().unwrap_or(Value::Null);

    let response = match request.method.as_str() {
        "initialize" => success_response(id, initialize_result()),
        "ping" => success_response(id, json!({})),
        "tools/list" => success_response(id, json!({ "tools": dispatcher.list_tools() })),
        "tools/call" => handle_tools_call(dispatcher, id, request.params).await,
        other => {
            error!("Unknown method: {}", other);
            error_response(id, METHOD_NOT_FOUND, "Method not found", None)
        }
    };
    Some(response)
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": "Acquired.com payment tools: create payments and hosted payment links"
    })
}

async fn handle_tools_call(dispatcher: &Dispatcher, id: Value, params: Option<Value>) -> Value {
    let params: CallToolParams = match params.map(serde_json::from_value::<CallToolParams>) {
        Some(Ok(params)) => params,
        _ => return error_response(id, INVALID_PARAMS, "tools/call requires a tool name", None),
    };

    let arguments = match params.arguments {
        None | Some(Value::Null) => ToolArguments::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            let err = DispatchError::InvalidArguments("arguments must be an object".to_string());
            return dispatch_error_response(id, &err);
        }
    };

    match dispatcher.dispatch(InvocationRequest::new(params.name, arguments)).await {
        Ok(result) => success_response(id, tool_result(result)),
        Err(err) => dispatch_error_response(id, &err),
    }
}

/// MCP `CallToolResult` for a successful handler value
fn tool_result(result: Value) -> Value {
    let text = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());
    json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ],
        "structuredContent": {
            "success": true,
            "result": result
        },
        "isError": false
    })
}

fn dispatch_error_response(id: Value, err: &DispatchError) -> Value {
    error_response(
        id,
        err.jsonrpc_code(),
        &err.to_string(),
        Some(json!({ "kind": err.code() })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{FieldSpec, ParameterSpec, ToolDefinition, ToolRegistry};

    fn dispatcher() -> Dispatcher {
        let spec = ParameterSpec::new()
            .field("transaction", FieldSpec::object(ParameterSpec::new(), "Transaction"))
            .required(["transaction"]);
        let handler = |args: ToolArguments| async move {
            Ok::<_, anyhow::Error>(json!({"link_id": "L-1", "received": args}))
        };
        let registry = ToolRegistry::new()
            .with_tool(ToolDefinition::new("create_payment_link", "Create a link", spec, handler))
            .unwrap();
        Dispatcher::new(registry)
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = handle_message(&dispatcher(), r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list_is_stable() {
        let dispatcher = dispatcher();
        let raw = r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#;
        let first = handle_message(&dispatcher, raw).await.unwrap();
        let second = handle_message(&dispatcher, raw).await.unwrap();

        assert_eq!(first, second);
        let tools = first["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "create_payment_link");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["transaction"]));
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let raw = r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"create_payment_link","arguments":{"transaction":{"amount":5}}}}"#;
        let response = handle_message(&dispatcher(), raw).await.unwrap();

        let result = &response["result"];
        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"]["success"], true);
        assert_eq!(result["structuredContent"]["result"]["link_id"], "L-1");
        let text = result["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed, result["structuredContent"]["result"]);
    }

    #[tokio::test]
    async fn test_tools_call_errors() {
        let dispatcher = dispatcher();

        let missing = handle_message(
            &dispatcher,
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"create_payment_link","arguments":{}}}"#,
        )
        .await
        .unwrap();
        assert_eq!(missing["error"]["code"], INVALID_PARAMS);
        assert_eq!(missing["error"]["message"], "Missing required parameter: transaction");
        assert_eq!(missing["error"]["data"]["kind"], "missing_parameter");

        let unknown = handle_message(
            &dispatcher,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nonexistent_tool"}}"#,
        )
        .await
        .unwrap();
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(unknown["error"]["message"], "Unknown tool: nonexistent_tool");

        let bad_args = handle_message(
            &dispatcher,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"create_payment_link","arguments":[1,2]}}"#,
        )
        .await
        .unwrap();
        assert_eq!(bad_args["error"]["data"]["kind"], "invalid_arguments");

        let no_name = handle_message(&dispatcher, r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{}}"#)
            .await
            .unwrap();
        assert_eq!(no_name["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_notifications_and_malformed_input() {
        let dispatcher = dispatcher();

        assert!(handle_message(&dispatcher, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());

        let parse = handle_message(&dispatcher, "{not json").await.unwrap();
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert!(parse["id"].is_null());

        let invalid = handle_message(&dispatcher, r#"{"jsonrpc":"2.0","id":9}"#).await.unwrap();
        assert_eq!(invalid["error"]["code"], INVALID_REQUEST);
        assert_eq!(invalid["id"], 9);

        let unknown = handle_message(&dispatcher, r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);
    }
}
