//! Fake Confluence and Jira clients for testing
//!
//! These stubs implement the API traits with predefined responses and record
//! every fetch so tests can assert which URLs were requested.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use atlassian_mcp::atlassian::{ByteStream, ConfluenceApi, ConfluenceUser, FetchSession, JiraApi, JiraUser};
use atlassian_mcp::error::ApiError;
use futures::StreamExt;
use serde_json::Value;

use crate::common::fixtures;

/// What a fetch of one URL produces.
#[derive(Clone)]
pub enum FakeBody {
  /// Full body delivered in chunks of at most 4 bytes.
  Bytes(Vec<u8>),
  /// The request itself fails.
  Fail(ApiError),
  /// Some bytes arrive, then the stream fails.
  Truncated(Vec<u8>, ApiError),
}

/// A fake Confluence instance that serves listings, bodies and the current
/// user from memory.
pub struct FakeConfluence {
  base_url: String,
  listings: HashMap<String, Result<Vec<Value>, ApiError>>,
  bodies: HashMap<String, (FakeBody, Duration)>,
  user: Result<ConfluenceUser, ApiError>,
  fetched: Mutex<Vec<String>>,
}

impl FakeConfluence {
  pub fn new(base_url: &str) -> Self {
    Self {
      base_url: base_url.to_string(),
      listings: HashMap::new(),
      bodies: HashMap::new(),
      user: Ok(fixtures::confluence_user()),
      fetched: Mutex::new(Vec::new()),
    }
  }

  /// Attachment payloads returned for `page_id`.
  pub fn with_attachments(mut self, page_id: &str, payloads: Vec<Value>) -> Self {
    self.listings.insert(page_id.to_string(), Ok(payloads));
    self
  }

  /// Make the listing of `page_id` fail.
  pub fn with_listing_error(mut self, page_id: &str, err: ApiError) -> Self {
    self.listings.insert(page_id.to_string(), Err(err));
    self
  }

  /// Serve `body` for `url`.
  pub fn with_body(self, url: &str, body: &[u8]) -> Self {
    self.with_fetch(url, FakeBody::Bytes(body.to_vec()), Duration::ZERO)
  }

  /// Serve `body` for `url` after `delay`.
  pub fn with_fetch(mut self, url: &str, body: FakeBody, delay: Duration) -> Self {
    self.bodies.insert(url.to_string(), (body, delay));
    self
  }

  pub fn with_user(mut self, user: Result<ConfluenceUser, ApiError>) -> Self {
    self.user = user;
    self
  }

  /// URLs fetched so far, in request order.
  pub fn fetched(&self) -> Vec<String> {
    self.fetched.lock().unwrap().clone()
  }
}

#[async_trait]
impl ConfluenceApi for FakeConfluence {
  fn base_url(&self) -> &str {
    &self.base_url
  }

  async fn get_attachments_for_page(&self, page_id: &str) -> Result<Vec<Value>, ApiError> {
    self.listings.get(page_id).cloned().unwrap_or_else(|| {
      Err(ApiError::Status {
        status: 404,
        endpoint: format!("/rest/api/content/{page_id}/child/attachment"),
        body: format!("No content found with id: {page_id}"),
      })
    })
  }

  async fn current_user(&self) -> Result<ConfluenceUser, ApiError> {
    self.user.clone()
  }
}

#[async_trait]
impl FetchSession for FakeConfluence {
  async fn fetch(&self, url: &str) -> Result<ByteStream, ApiError> {
    self.fetched.lock().unwrap().push(url.to_string());

    let Some((body, delay)) = self.bodies.get(url).cloned() else {
      return Err(ApiError::Status {
        status: 404,
        endpoint: url.to_string(),
        body: "Not Found".to_string(),
      });
    };

    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }

    let chunks = |bytes: Vec<u8>| -> Vec<Result<Vec<u8>, ApiError>> { bytes.chunks(4).map(|c| Ok(c.to_vec())).collect() };

    match body {
      FakeBody::Bytes(bytes) => Ok(futures::stream::iter(chunks(bytes)).boxed()),
      FakeBody::Fail(err) => Err(err),
      FakeBody::Truncated(bytes, err) => {
        let mut items = chunks(bytes);
        items.push(Err(err));
        Ok(futures::stream::iter(items).boxed())
      }
    }
  }
}

/// A fake Jira instance that only answers the identity endpoint.
pub struct FakeJira {
  base_url: String,
  user: Result<JiraUser, ApiError>,
}

impl FakeJira {
  pub fn new(base_url: &str) -> Self {
    Self {
      base_url: base_url.to_string(),
      user: Ok(fixtures::jira_user()),
    }
  }

  pub fn with_user(mut self, user: Result<JiraUser, ApiError>) -> Self {
    self.user = user;
    self
  }
}

#[async_trait]
impl JiraApi for FakeJira {
  fn base_url(&self) -> &str {
    &self.base_url
  }

  async fn current_user(&self) -> Result<JiraUser, ApiError> {
    self.user.clone()
  }
}
