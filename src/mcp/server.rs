// MCP Server Implementation
//
// Newline-delimited JSON-RPC over stdio. Each request runs in its own task
// so slow payment calls do not hold up others; responses are funnelled
// through a single writer task so lines never interleave.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::mcp::protocol::handle_message;
use crate::tools::Dispatcher;

/// MCP Server for handling Model Context Protocol requests
pub struct MCPServer {
    dispatcher: Arc<Dispatcher>,
}

impl MCPServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Run the MCP server with stdio transport until stdin closes
    pub async fn run(self) -> Result<()> {
        info!("Starting MCP server with stdio transport");
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await?;
        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Serve messages from `reader` until EOF, waiting for in-flight calls
    /// before handing the writer back
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(line) = rx.recv().await {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<W, std::io::Error>(writer)
        });

        let mut in_flight = JoinSet::new();
        let mut lines = reader.lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let message = trimmed.to_string();
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let tx = tx.clone();
                    in_flight.spawn(async move {
                        let Some(response) = handle_message(&dispatcher, &message).await else {
                            return;
                        };
                        match serde_json::to_string(&response) {
                            Ok(encoded) => {
                                if tx.send(encoded).is_err() {
                                    error!("response writer closed, dropping response");
                                }
                            }
                            Err(e) => error!("Failed to encode response: {}", e),
                        }
                    });
                }
                Ok(None) => break, // EOF
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }

            while let Some(finished) = in_flight.try_join_next() {
                if let Err(e) = finished {
                    error!("Request task failed: {}", e);
                }
            }
        }

        while let Some(finished) = in_flight.join_next().await {
            if let Err(e) = finished {
                error!("Request task failed: {}", e);
            }
        }
        drop(tx);

        let writer = writer_task.await??;
        Ok(writer)
    }
}
