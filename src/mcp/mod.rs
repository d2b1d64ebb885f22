// MCP (Model Context Protocol) Server
//
// A small hand-rolled JSON-RPC implementation that exposes the tool
// registry to MCP clients over stdio.

pub mod protocol;
pub mod server;

pub use protocol::{handle_message, handle_request, JsonRpcRequest, PROTOCOL_VERSION, SERVER_NAME};
pub use server::MCPServer;
