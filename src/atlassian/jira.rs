//! Minimal Jira client used for connection checks.

use anyhow::Result;
use async_trait::async_trait;

use super::api::JiraApi;
use super::http::{Auth, ClientOptions, RestClient};
use super::models::JiraUser;
use crate::error::ApiError;

/// Jira API client.
#[derive(Clone)]
pub struct JiraClient {
  rest: RestClient,
}

impl JiraClient {
  /// Create a new Jira client for `base_url` (e.g., `https://example.atlassian.net`).
  ///
  /// # Errors
  /// Returns an error if the rate limit is zero or the HTTP client cannot be
  /// built.
  pub fn new(base_url: impl Into<String>, auth: Auth, options: &ClientOptions) -> Result<Self> {
    Ok(Self {
      rest: RestClient::new(base_url, auth, options)?,
    })
  }
}

#[async_trait]
impl JiraApi for JiraClient {
  fn base_url(&self) -> &str {
    self.rest.base_url()
  }

  async fn current_user(&self) -> Result<JiraUser, ApiError> {
    self.rest.get_json("/rest/api/2/myself").await
  }
}
