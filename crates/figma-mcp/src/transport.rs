//! Transports the server can be exposed over.

use anyhow::Context;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::ServiceExt;
use tracing::{info, warn};

use crate::server::FigmaMcpServer;

/// Path the streamable HTTP endpoint is mounted at.
pub const MCP_PATH: &str = "/mcp";

/// Serve a single client over stdin/stdout until it disconnects.
pub async fn serve_stdio(server: FigmaMcpServer) -> anyhow::Result<()> {
    info!("figma-mcp starting (stdio transport)");
    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;
    Ok(())
}

/// Build the axum router hosting the streamable HTTP endpoint. Each session
/// gets its own clone of `server`.
pub fn http_router(server: FigmaMcpServer) -> axum::Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig::default(),
    );
    axum::Router::new().nest_service(MCP_PATH, service)
}

/// Serve streamable HTTP on `host:port` until Ctrl-C.
pub async fn serve_http(server: FigmaMcpServer, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    let addr = listener.local_addr()?;
    info!(%addr, path = MCP_PATH, "figma-mcp listening (streamable HTTP transport)");

    axum::serve(listener, http_router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    info!("figma-mcp stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
