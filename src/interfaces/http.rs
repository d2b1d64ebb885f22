// HTTP Interface
//
// REST endpoints over the shared dispatcher, plus a single-message MCP
// endpoint for clients that speak JSON-RPC over HTTP.

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::DispatchError;
use crate::mcp::handle_message;
use crate::tools::{Dispatcher, Envelope, InvocationRequest, ToolDescriptor};

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/tools/call", post(call_tool))
        .route("/mcp", post(mcp_message))
        .with_state(dispatcher)
}

/// Run the HTTP interface
pub async fn run_http_interface(dispatcher: Arc<Dispatcher>, bind_addr: &str) -> Result<()> {
    info!("🌐 Starting HTTP interface...");

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("✅ HTTP interface ready - listening on http://{}", bind_addr);

    axum::serve(listener, router(dispatcher))
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "acquired-mcp-server",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_tools(State(dispatcher): State<Arc<Dispatcher>>) -> Json<Vec<ToolDescriptor>> {
    Json(dispatcher.list_tools())
}

/// Run one tool and answer with its envelope
async fn call_tool(State(dispatcher): State<Arc<Dispatcher>>, body: String) -> (StatusCode, Json<Envelope>) {
    let request: InvocationRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected tool call body: {}", e);
            let err = DispatchError::InvalidArguments(e.to_string());
            return (status_for(&err), Json(Envelope::from(Err::<Value, _>(err))));
        }
    };

    let outcome = dispatcher.dispatch(request).await;
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(err) => status_for(err),
    };
    (status, Json(Envelope::from(outcome)))
}

fn status_for(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::UnknownTool(_) => StatusCode::NOT_FOUND,
        DispatchError::MissingParameter(_) | DispatchError::InvalidArguments(_) => StatusCode::BAD_REQUEST,
        DispatchError::ToolExecution(_) => StatusCode::BAD_GATEWAY,
    }
}

/// One JSON-RPC message in, one response out. Notifications get 202.
async fn mcp_message(State(dispatcher): State<Arc<Dispatcher>>, body: String) -> Response {
    match handle_message(&dispatcher, &body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{FieldSpec, ParameterSpec, ToolArguments, ToolDefinition, ToolRegistry};

    fn dispatcher() -> Arc<Dispatcher> {
        let spec = ParameterSpec::new()
            .field("transaction", FieldSpec::object(ParameterSpec::new(), "Transaction"))
            .required(["transaction"]);
        let ok = |_args: ToolArguments| async { Ok::<_, anyhow::Error>(json!({"status": "success"})) };
        let failing = |_args: ToolArguments| async {
            Err::<Value, _>(anyhow::anyhow!("API request failed with status 400: Validation failed"))
        };
        let registry = ToolRegistry::new()
            .with_tool(ToolDefinition::new("create_payment", "Create a payment", spec.clone(), ok))
            .unwrap()
            .with_tool(ToolDefinition::new("create_refund", "Always fails", spec, failing))
            .unwrap();
        Arc::new(Dispatcher::new(registry))
    }

    #[tokio::test]
    async fn test_list_tools() {
        let Json(tools) = list_tools(State(dispatcher())).await;
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["create_payment", "create_refund"]);
    }

    #[tokio::test]
    async fn test_call_tool_status_mapping() {
        let dispatcher = dispatcher();

        let (status, Json(envelope)) = call_tool(
            State(dispatcher.clone()),
            r#"{"name":"create_payment","arguments":{"transaction":{}}}"#.to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.result, Some(json!({"status": "success"})));

        let (status, Json(envelope)) = call_tool(
            State(dispatcher.clone()),
            r#"{"name":"nonexistent_tool","arguments":{}}"#.to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(envelope.error.unwrap().code, "unknown_tool");

        let (status, Json(envelope)) = call_tool(
            State(dispatcher.clone()),
            r#"{"toolName":"create_payment","arguments":{}}"#.to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.error.unwrap().message, "Missing required parameter: transaction");

        let (status, _) = call_tool(State(dispatcher.clone()), "not json".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, Json(envelope)) = call_tool(
            State(dispatcher),
            r#"{"name":"create_refund","arguments":{"transaction":{}}}"#.to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let error = envelope.error.unwrap();
        assert_eq!(error.code, "tool_execution_error");
        assert!(error.message.contains("Validation failed"));
    }

    #[tokio::test]
    async fn test_mcp_endpoint() {
        let dispatcher = dispatcher();

        let response = mcp_message(
            State(dispatcher.clone()),
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = mcp_message(
            State(dispatcher),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
