//! Figma MCP Server library.
//!
//! Provides the [`FigmaMcpServer`](server::FigmaMcpServer) handler, its
//! configuration and the stdio / streamable HTTP transports. Used by the
//! `figma-mcp` binary and available for integration testing.

pub mod config;
pub mod server;
pub mod tools;
pub mod transport;
