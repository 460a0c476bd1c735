//! Trait definitions for interacting with Confluence and Jira.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use super::models::{ConfluenceUser, JiraUser};
use crate::error::ApiError;

/// Stream of body chunks produced by a [`FetchSession`].
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ApiError>>;

/// Trait for Confluence API operations (enables testing with fake
/// implementations).
#[async_trait]
pub trait ConfluenceApi: Send + Sync {
  /// Root URL of the instance (e.g. `https://example.atlassian.net/wiki`).
  ///
  /// Relative attachment download paths are resolved against this value.
  fn base_url(&self) -> &str;

  /// List the raw attachment payloads of a page.
  ///
  /// # Arguments
  /// * `page_id` - Identifier of the page whose attachments should be listed.
  ///
  /// # Returns
  /// One JSON object per attachment, in the order returned by the API.
  ///
  /// # Errors
  /// Unknown pages and authorization failures surface as [`ApiError`]; callers
  /// of the attachment core receive them unchanged.
  async fn get_attachments_for_page(&self, page_id: &str) -> Result<Vec<Value>, ApiError>;

  /// Fetch the user the configured credentials belong to.
  ///
  /// # Returns
  /// The authenticated user's profile, confirming credentials are valid.
  async fn current_user(&self) -> Result<ConfluenceUser, ApiError>;
}

/// Trait for the Jira operations the server needs.
#[async_trait]
pub trait JiraApi: Send + Sync {
  /// Root URL of the instance (e.g. `https://example.atlassian.net`).
  fn base_url(&self) -> &str;

  /// Fetch the user the configured credentials belong to.
  async fn current_user(&self) -> Result<JiraUser, ApiError>;
}

/// Authenticated HTTP session used to stream remote files.
///
/// The attachment fetcher borrows a session from its caller and never closes
/// it; timeouts and rate limiting are the session's responsibility.
#[async_trait]
pub trait FetchSession: Send + Sync {
  /// Issue a GET for `url` and return the body as a stream of chunks.
  ///
  /// # Errors
  /// Returns [`ApiError::Status`] for non-success responses and
  /// [`ApiError::Transport`] when no response arrives. Errors that occur while
  /// the body is streaming are yielded by the stream itself.
  async fn fetch(&self, url: &str) -> Result<ByteStream, ApiError>;
}
