// Acquired.com MCP Server Library
//
// Payment tools for Acquired.com exposed over the Model Context Protocol.
// The gateway handles authentication and retries, tools describe and run
// the API operations, and the interfaces put them on stdio or HTTP.

pub mod config;
pub mod error;
pub mod gateway;
pub mod interfaces;
pub mod mcp;
pub mod tools;

pub use config::{AcquiredConfig, Environment, ServerConfig};
pub use error::{DispatchError, GatewayError, RegistryError};
pub use gateway::{AcquiredClient, HttpTransport, ReqwestTransport, RetryPolicy, TokenCache};
pub use tools::{acquired_registry, Dispatcher, Envelope, InvocationRequest, ToolDefinition, ToolRegistry};
