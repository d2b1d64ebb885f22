// Service Interfaces
//
// Outer surfaces over the shared dispatcher: the MCP stdio server and, with
// the `http` feature, a small axum REST interface.

#[cfg(feature = "http")]
pub mod http;

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use crate::mcp::MCPServer;
use crate::tools::Dispatcher;

/// Run the MCP interface on stdin/stdout until the client disconnects
pub async fn run_mcp_interface(dispatcher: Arc<Dispatcher>) -> Result<()> {
    info!("🤖 Starting MCP interface...");
    info!("   {} tool(s) registered: {}", dispatcher.registry().len(), dispatcher.registry().names().join(", "));

    let mcp_server = MCPServer::new(dispatcher);
    if let Err(e) = mcp_server.run().await {
        error!("❌ MCP interface error: {}", e);
        return Err(e);
    }

    Ok(())
}
