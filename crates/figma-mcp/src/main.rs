//! Figma MCP Server
//!
//! Model Context Protocol server exposing simplified Figma design data and
//! image export to LLM coding agents.

use clap::Parser;
use figma_mcp::config::{load_env_file, Cli, ServerConfig, Transport};
use figma_mcp::server::FigmaMcpServer;
use figma_mcp::transport;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Loaded before the subscriber so RUST_LOG may come from the file.
    let env_file = load_env_file(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("figma_mcp=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let mut config = ServerConfig::resolve(&cli, |key| std::env::var(key).ok())?;
    config.env_file = env_file;
    config.log_summary();

    let transport_kind = config.transport.value;
    let host = config.host.value.clone();
    let port = config.port.value;
    let server = FigmaMcpServer::from_config(config)?;

    match transport_kind {
        Transport::Stdio => transport::serve_stdio(server).await,
        Transport::Http => transport::serve_http(server, &host, port).await,
    }
}
