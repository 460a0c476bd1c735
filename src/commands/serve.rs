//! `atlassian-mcp serve`: run the MCP server on stdio.

use anyhow::{Context, Result};

use super::{build_services, load_config};
use crate::cli::Cli;
use crate::mcp::{McpServer, ServerOptions};

/// Resolve configuration, build clients and serve until stdin closes or a
/// termination signal arrives.
pub(crate) async fn handle_serve_command(cli: &Cli) -> Result<()> {
  let config = load_config(cli)?;

  if config.confluence.is_none() && config.jira.is_none() {
    tracing::warn!("Neither Confluence nor Jira is configured; only status reporting is available");
  }

  let services = build_services(&config)?;
  let options = ServerOptions {
    parallel: config.parallel,
    enabled_tools: config.enabled_tools.clone(),
  };

  let mut server = McpServer::new(services, options);
  server.run().await.context("MCP server stopped with an I/O error")?;

  tracing::info!("MCP server shut down");
  Ok(())
}
