// Tool Dispatcher
//
// Resolves an invocation to a registered tool, checks required arguments,
// runs the handler in its own task and reduces every outcome to a
// structured result:
//
//   Received -> Validated -> Invoked -> Completed | Failed
//
// Unknown tools and missing parameters fail before any handler runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument, Span};
use uuid::Uuid;

use super::definition::{ToolArguments, ToolDefinition, ToolDescriptor};
use super::registry::ToolRegistry;
use crate::error::DispatchError;

/// A request to run one tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(alias = "toolName")]
    pub name: String,
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl InvocationRequest {
    pub fn new(name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// `{success: true, result}` or `{success: false, error: {code, message}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<Result<Value, DispatchError>> for Envelope {
    fn from(outcome: Result<Value, DispatchError>) -> Self {
        match outcome {
            Ok(value) => Envelope {
                success: true,
                result: Some(value),
                error: None,
            },
            Err(err) => Envelope {
                success: false,
                result: None,
                error: Some(ErrorBody {
                    code: err.code().to_string(),
                    message: err.to_string(),
                }),
            },
        }
    }
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.list_tools()
    }

    /// Presence check for every required top-level field
    pub fn validate(tool: &ToolDefinition, arguments: &ToolArguments) -> Result<(), DispatchError> {
        match tool.parameters().first_missing(arguments) {
            Some(field) => Err(DispatchError::MissingParameter(field.to_string())),
            None => Ok(()),
        }
    }

    /// Run one invocation; failures never escape as panics.
    ///
    /// A successful result is the handler's value, unmodified.
    pub async fn dispatch(&self, request: InvocationRequest) -> Result<Value, DispatchError> {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("dispatch", tool = %request.name, %invocation_id);
        self.run(request).instrument(span).await
    }

    /// `dispatch` folded into a response envelope
    pub async fn dispatch_envelope(&self, request: InvocationRequest) -> Envelope {
        Envelope::from(self.dispatch(request).await)
    }

    async fn run(&self, request: InvocationRequest) -> Result<Value, DispatchError> {
        info!("received tool call");

        let tool = self.registry.find_tool(&request.name).map_err(|e| {
            error!("unknown tool");
            e
        })?;
        Self::validate(tool, &request.arguments).map_err(|e| {
            error!(error = %e, "invalid arguments");
            e
        })?;
        info!("arguments validated, invoking handler");

        let handler = tool.handler();
        let arguments = request.arguments;
        // Own task so a panicking handler cannot take the dispatcher down,
        // and an abandoned caller leaves the call to finish on its own.
        let joined = tokio::spawn(async move { handler.call(arguments).await }.instrument(Span::current())).await;

        match joined {
            Ok(Ok(value)) => {
                info!("tool call completed");
                Ok(value)
            }
            Ok(Err(err)) => {
                error!(error = %format!("{:#}", err), "tool call failed");
                Err(DispatchError::ToolExecution(format!("{:#}", err)))
            }
            Err(join_err) if join_err.is_panic() => {
                error!("tool handler panicked");
                Err(DispatchError::ToolExecution("tool handler panicked".to_string()))
            }
            Err(join_err) => {
                error!(error = %join_err, "tool handler did not finish");
                Err(DispatchError::ToolExecution("tool handler was cancelled".to_string()))
            }
        }
    }
}
