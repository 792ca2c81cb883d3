//! Local streamable-HTTP host for the MCP server.

use std::net::{IpAddr, SocketAddr};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use anyhow::{Result, anyhow};
use axum::Router;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::registry::ToolRegistry;
use crate::server::core::N8nMcpServer;

/// Default bind address: loopback with an OS-assigned port.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:0";

/// Host configuration for a local MCP HTTP server instance.
#[derive(Debug, Clone)]
pub struct McpHttpServer {
    bind_address: SocketAddr,
    registry: Arc<ToolRegistry>,
}

impl McpHttpServer {
    pub fn new(bind_address: SocketAddr, registry: Arc<ToolRegistry>) -> Self {
        Self { bind_address, registry }
    }

    /// Start the server and return a handle for runtime inspection and shutdown.
    pub async fn start(self) -> Result<RunningMcpHttpServer> {
        let cancellation_token = CancellationToken::new();
        let session_manager = Arc::new(LocalSessionManager::default());
        let client_counter = Arc::new(AtomicUsize::new(0));
        let monitor_handle = spawn_session_monitor(
            Arc::clone(&session_manager),
            Arc::clone(&client_counter),
            cancellation_token.child_token(),
        );

        let registry = Arc::clone(&self.registry);
        let service: StreamableHttpService<N8nMcpServer, LocalSessionManager> = StreamableHttpService::new(
            move || Ok(N8nMcpServer::new(Arc::clone(&registry))),
            Arc::clone(&session_manager),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: None,
                cancellation_token: cancellation_token.child_token(),
                ..Default::default()
            },
        );

        let router = Router::new().nest_service("/mcp", service);
        let listener = tokio::net::TcpListener::bind(self.bind_address).await?;
        let bound_address = listener.local_addr()?;
        info!(address = %bound_address, "serving MCP over HTTP at /mcp");

        let server_handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                let _ = axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown.cancelled().await;
                    })
                    .await;
            }
        });

        Ok(RunningMcpHttpServer {
            bind_address: bound_address,
            cancellation_token,
            server_handle,
            monitor_handle,
            client_counter,
        })
    }
}

/// Runtime handle for a running MCP HTTP server.
#[derive(Debug)]
pub struct RunningMcpHttpServer {
    bind_address: SocketAddr,
    cancellation_token: CancellationToken,
    server_handle: JoinHandle<()>,
    monitor_handle: JoinHandle<()>,
    client_counter: Arc<AtomicUsize>,
}

impl RunningMcpHttpServer {
    pub fn bound_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Most recently observed session count.
    pub fn connected_clients(&self) -> usize {
        self.client_counter.load(Ordering::Relaxed)
    }

    /// Stop the server and wait for background tasks to finish.
    pub async fn stop(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.monitor_handle
            .await
            .map_err(|error| anyhow!("MCP HTTP monitor task failed: {error}"))?;
        self.server_handle
            .await
            .map_err(|error| anyhow!("MCP HTTP server task failed: {error}"))?;
        info!("MCP HTTP server stopped");
        Ok(())
    }
}

/// Resolve a safe local bind address for the MCP HTTP server.
pub fn resolve_bind_address(bind_address: Option<&str>) -> Result<SocketAddr> {
    let address = bind_address.unwrap_or(DEFAULT_BIND_ADDRESS);
    let parsed: SocketAddr = address
        .parse()
        .map_err(|error| anyhow!("invalid MCP HTTP bind address '{address}': {error}"))?;
    if !is_loopback(parsed.ip()) {
        return Err(anyhow!("MCP HTTP server must bind to a loopback address, got '{address}'"));
    }
    Ok(parsed)
}

fn is_loopback(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => ip.is_loopback(),
        IpAddr::V6(ip) => ip.is_loopback(),
    }
}

fn spawn_session_monitor(
    session_manager: Arc<LocalSessionManager>,
    client_counter: Arc<AtomicUsize>,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(500));
        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = ticker.tick() => {
                    let count = session_manager.sessions.read().await.len();
                    if count != client_counter.swap(count, Ordering::Relaxed) {
                        debug!(sessions = count, "MCP HTTP session count changed");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_must_be_loopback() {
        assert!(resolve_bind_address(None).is_ok());
        assert_eq!(
            resolve_bind_address(Some("[::1]:8080")).expect("ipv6 loopback").port(),
            8080
        );
        assert!(resolve_bind_address(Some("0.0.0.0:8080")).is_err());
        assert!(resolve_bind_address(Some("not an address")).is_err());
    }

    #[tokio::test]
    async fn starts_and_stops_on_an_ephemeral_port() {
        let registry = Arc::new(ToolRegistry::builder().build());
        let server = McpHttpServer::new(resolve_bind_address(None).expect("default"), registry)
            .start()
            .await
            .expect("start");
        assert_ne!(server.bound_address().port(), 0);
        assert_eq!(server.connected_clients(), 0);
        server.stop().await.expect("stop");
    }
}
