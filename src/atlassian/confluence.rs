//! HTTP client implementation for talking to the Confluence REST API.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use super::api::{ByteStream, ConfluenceApi, FetchSession};
use super::http::{Auth, ClientOptions, RestClient};
use super::models::{AttachmentListing, ConfluenceUser};
use super::url::is_page_id;
use crate::error::ApiError;

/// Number of attachments requested per listing page.
const ATTACHMENT_PAGE_SIZE: usize = 50;

/// Confluence API client.
#[derive(Clone)]
pub struct ConfluenceClient {
  rest: RestClient,
}

impl ConfluenceClient {
  /// Create a new Confluence client.
  ///
  /// # Arguments
  /// * `base_url` - Root of the instance including any context path (e.g.,
  ///   `https://example.atlassian.net/wiki`)
  /// * `auth` - Credentials used for every request
  /// * `options` - Timeout, rate limit and TLS settings
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
impl ConfluenceApi for ConfluenceClient {
  fn base_url(&self) -> &str {
    self.rest.base_url()
  }

  async fn get_attachments_for_page(&self, page_id: &str) -> Result<Vec<Value>, ApiError> {
    if !is_page_id(page_id) {
      return Err(ApiError::InvalidPageId(page_id.to_string()));
    }

    let mut attachments = Vec::new();
    let mut start = 0;

    loop {
      let path = format!("/rest/api/content/{page_id}/child/attachment?start={start}&limit={ATTACHMENT_PAGE_SIZE}");
      let listing: AttachmentListing = self.rest.get_json(&path).await?;

      let fetched = listing.results.len();
      let more = listing.has_next();
      attachments.extend(listing.results);

      if fetched == 0 || !more {
        break;
      }
      start += fetched;
    }

    tracing::debug!(page_id, count = attachments.len(), "Listed page attachments");
    Ok(attachments)
  }

  async fn current_user(&self) -> Result<ConfluenceUser, ApiError> {
    self.rest.get_json("/rest/api/user/current").await
  }
}

#[async_trait]
impl FetchSession for ConfluenceClient {
  async fn fetch(&self, url: &str) -> Result<ByteStream, ApiError> {
    self.rest.fetch(url).await
  }
}
