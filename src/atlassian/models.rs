//! Data transfer objects returned by the Confluence and Jira REST APIs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of `GET /rest/api/content/{id}/child/attachment`.
///
/// Attachments stay as raw JSON here; typed parsing happens in
/// [`crate::attachments::Attachment::from_api_response`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentListing {
  /// Raw attachment payloads included in this page of results.
  #[serde(default)]
  pub results: Vec<Value>,
  /// Pagination links.
  #[serde(rename = "_links", default)]
  pub links: Option<ListingLinks>,
}

impl AttachmentListing {
  /// Whether the API advertised another page of results.
  pub fn has_next(&self) -> bool {
    self.links.as_ref().and_then(|links| links.next.as_ref()).is_some()
  }
}

/// Pagination links attached to list responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingLinks {
  /// Relative link to the next page, absent on the last page.
  pub next: Option<String>,
}

/// User returned by `GET /rest/api/user/current` (Confluence).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfluenceUser {
  #[serde(rename = "accountId", default)]
  /// Stable Atlassian account identifier (Cloud only).
  pub account_id: Option<String>,
  /// Primary email address if the API caller is permitted to view it.
  #[serde(default)]
  pub email: Option<String>,
  #[serde(rename = "displayName", default)]
  /// Full display name configured in the profile.
  pub display_name: Option<String>,
  #[serde(rename = "publicName", default)]
  /// Publicly visible name, which may differ from `display_name`.
  pub public_name: Option<String>,
  /// Login name (Server/Data Center only).
  #[serde(default)]
  pub username: Option<String>,
}

impl ConfluenceUser {
  /// Best human-readable identity: email, then display name, then login.
  pub fn identity(&self) -> Option<String> {
    self
      .email
      .clone()
      .or_else(|| self.display_name.clone())
      .or_else(|| self.username.clone())
  }
}

/// User returned by `GET /rest/api/2/myself` (Jira).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraUser {
  #[serde(rename = "accountId", default)]
  /// Stable Atlassian account identifier (Cloud only).
  pub account_id: Option<String>,
  #[serde(rename = "emailAddress", default)]
  /// Email address if visible to the caller.
  pub email_address: Option<String>,
  #[serde(rename = "displayName", default)]
  /// Full display name.
  pub display_name: Option<String>,
  /// Login name (Server/Data Center only).
  #[serde(default)]
  pub name: Option<String>,
}

impl JiraUser {
  /// Best human-readable identity: email, then display name, then login.
  pub fn identity(&self) -> Option<String> {
    self
      .email_address
      .clone()
      .or_else(|| self.display_name.clone())
      .or_else(|| self.name.clone())
  }
}
