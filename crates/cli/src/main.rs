mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use n8n_mcp::{McpHttpServer, ToolContext, default_registry, serve_stdio};
use n8n_mcp_api::N8nClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, TransportConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Cli::parse().into_config()?;
    let client = N8nClient::new(&config.api)?;
    info!(base_url = %config.api.base_url(), "n8n API client ready");

    let context = ToolContext::new(Arc::new(client), config.execution);
    let registry = Arc::new(default_registry(&context).context("failed to register tools")?);

    match config.transport {
        TransportConfig::Stdio => serve_stdio(registry).await,
        TransportConfig::Http(address) => {
            let server = McpHttpServer::new(address, registry).start().await?;
            info!(address = %server.bound_address(), "press ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
            server.stop().await
        }
    }
}

/// Logs go to stderr; stdout belongs to the stdio transport.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
