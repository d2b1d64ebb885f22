// Error Types
//
// Typed failures for the payment gateway client and the tool dispatcher.
// Handler code works in `anyhow`; everything that crosses the dispatch
// boundary is reduced to one of these.

use serde_json::Value;
use thiserror::Error;

/// Failures raised while talking to the Acquired.com API
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The login exchange failed, or the API rejected a fresh token again
    #[error("authentication with Acquired.com failed: {0}")]
    Authentication(String),

    /// DNS, connect or read failure before a status line was received
    #[error("transport error: {0}")]
    Transport(String),

    /// Any non-success status other than the one-shot 401 recovery
    #[error("API request failed with status {status}: {message}")]
    ApiRequest {
        status: u16,
        message: String,
        body: Value,
    },
}

impl GatewayError {
    /// Build an `ApiRequest` error from a status and the parsed error body.
    ///
    /// The message is taken from the body's `message` field when present.
    pub fn api_request(status: u16, body: Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("API request failed")
            .to_string();
        GatewayError::ApiRequest { status, message, body }
    }
}

/// Failures produced by `Dispatcher::dispatch`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("API error: {0}")]
    ToolExecution(String),
}

impl DispatchError {
    /// Stable machine-readable code used in response envelopes
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::UnknownTool(_) => "unknown_tool",
            DispatchError::MissingParameter(_) => "missing_parameter",
            DispatchError::InvalidArguments(_) => "invalid_arguments",
            DispatchError::ToolExecution(_) => "tool_execution_error",
        }
    }

    /// JSON-RPC 2.0 error code for the MCP transports
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            DispatchError::UnknownTool(_) => -32601,
            DispatchError::MissingParameter(_) | DispatchError::InvalidArguments(_) => -32602,
            DispatchError::ToolExecution(_) => -32603,
        }
    }
}

/// Rejections raised while building a `ToolRegistry`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("tool name must not be empty")]
    EmptyName,

    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("tool '{tool}' requires field '{field}' which is not declared in its schema")]
    UndeclaredRequiredField { tool: String, field: String },
}
