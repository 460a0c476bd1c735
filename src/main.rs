//! atlassian-mcp - Confluence attachments and Atlassian status over MCP
//!
//! This is the main entry point for the CLI application.

#[tokio::main]
async fn main() {
  atlassian_mcp::cli::run().await;
}
