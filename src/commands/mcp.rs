//! MCP server command handler.
//!
//! This module implements the `fintrack serve` command which runs an MCP server for AI agent
//! integration.

use crate::commands::Out;
use crate::mcp::Io;
use crate::{mcp, Config, Finance, Mode, Result};

/// Runs the MCP server.
///
/// This launches a long-running process that communicates via JSON-RPC over stdin/stdout. One
/// `Finance`, and therefore one cache, serves every tool call for the life of the process.
pub async fn serve(config: Config, mode: Mode) -> Result<Out<()>> {
    let finance = Finance::connect(&config, mode).await?;
    mcp::run_server(finance, Io::Stdio).await?;
    Ok("Done running MCP server".into())
}
