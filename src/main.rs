// Acquired.com MCP Server - Command Line Interface

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use acquired_mcp::config::AcquiredConfig;
use acquired_mcp::gateway::{AcquiredClient, ReqwestTransport};
use acquired_mcp::interfaces;
use acquired_mcp::tools::{acquired_registry, Dispatcher};

/// MCP server exposing Acquired.com payment tools
#[derive(Parser)]
#[command(name = "acquired-mcp-server")]
#[command(version)]
#[command(about = "MCP server for the Acquired.com payments API", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Stdio,

    /// Serve the tools over HTTP
    #[cfg(feature = "http")]
    Http {
        /// Address to bind, overrides HTTP_BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print the tool catalog as JSON
    Tools,

    /// Verify the configured credentials against the API
    CheckAuth,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // stdout belongs to the MCP protocol; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn build_client() -> Result<Arc<AcquiredClient>> {
    let config = AcquiredConfig::from_env()?;
    debug!("Loaded configuration: {:?}", config);
    info!("🔧 Acquired.com environment: {:?} ({})", config.environment, config.api_url());

    let transport = Arc::new(ReqwestTransport::new());
    Ok(Arc::new(AcquiredClient::from_config(&config, transport)))
}

fn build_dispatcher() -> Result<Arc<Dispatcher>> {
    let registry = acquired_registry(build_client()?)?;
    Ok(Arc::new(Dispatcher::new(registry)))
}

async fn check_auth() -> Result<()> {
    let client = build_client()?;
    match client.get("/customers").await {
        Ok(_) => {
            println!("{} credentials accepted by Acquired.com", "✓".green().bold());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red().bold(), e);
            Err(e.into())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Stdio) {
        Commands::Stdio => interfaces::run_mcp_interface(build_dispatcher()?).await,
        #[cfg(feature = "http")]
        Commands::Http { bind } => {
            let bind_addr = bind.unwrap_or_else(|| acquired_mcp::config::ServerConfig::from_env().bind_addr);
            interfaces::http::run_http_interface(build_dispatcher()?, &bind_addr).await
        }
        Commands::Tools => {
            let tools = build_dispatcher()?.list_tools();
            println!("{}", serde_json::to_string_pretty(&tools)?);
            Ok(())
        }
        Commands::CheckAuth => check_auth().await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
