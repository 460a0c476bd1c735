//! CLI subcommand handlers.
//!
//! Each handler resolves the configuration it needs from the parsed [`Cli`]
//! and reports results either as colored text or as JSON.

pub mod auth;
pub mod completions;
pub mod download;
pub mod serve;
pub mod status;
pub mod version;

use std::sync::Arc;

use anyhow::Result;

use crate::atlassian::JiraApi;
use crate::cli::Cli;
use crate::config::AppConfig;
use crate::credentials::NetrcProvider;
use crate::mcp::{ConfluenceHandle, Services};

/// Resolve the application configuration using `~/.netrc` as the credential
/// fallback.
pub(crate) fn load_config(cli: &Cli) -> Result<AppConfig> {
  let provider = NetrcProvider::new();
  Ok(cli.app_config(&provider)?)
}

/// Build API clients for every configured service.
///
/// # Errors
/// Returns an error when an HTTP client cannot be constructed.
pub(crate) fn build_services(config: &AppConfig) -> Result<Services> {
  let confluence = match &config.confluence {
    Some(service) => {
      let client = Arc::new(service.confluence_client(&config.client)?);
      Some(ConfluenceHandle {
        api: client.clone(),
        session: client,
      })
    }
    None => None,
  };

  let jira: Option<Arc<dyn JiraApi>> = match &config.jira {
    Some(service) => Some(Arc::new(service.jira_client(&config.client)?)),
    None => None,
  };

  Ok(Services { confluence, jira })
}
