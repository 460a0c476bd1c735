//! Test fixtures for Confluence and Jira API responses
//!
//! Payload shapes follow the Confluence Cloud REST API.

use atlassian_mcp::atlassian::{ConfluenceUser, JiraUser};
use atlassian_mcp::error::ApiError;
use serde_json::{Value, json};

pub const CLOUD_BASE: &str = "https://example.atlassian.net/wiki";

/// One attachment listing entry with a relative download link.
pub fn attachment(id: &str, title: &str, size: u64) -> Value {
  json!({
    "id": id,
    "type": "attachment",
    "status": "current",
    "title": title,
    "extensions": {
      "mediaType": "application/octet-stream",
      "fileSize": size
    },
    "_links": {
      "download": download_path(id, title),
      "self": format!("{CLOUD_BASE}/rest/api/content/{id}")
    }
  })
}

/// Relative download link used by [`attachment`].
pub fn download_path(id: &str, title: &str) -> String {
  format!("/download/attachments/123456/{}?version=1&api=v2&id={id}", title.replace(' ', "%20"))
}

/// Absolute URL the fetcher requests for [`attachment`].
pub fn download_url(id: &str, title: &str) -> String {
  format!("{CLOUD_BASE}{}", download_path(id, title))
}

/// Attachment with no `_links` at all.
pub fn attachment_without_links(id: &str, title: &str) -> Value {
  json!({
    "id": id,
    "type": "attachment",
    "title": title,
    "extensions": { "mediaType": "image/png", "fileSize": 10 }
  })
}

/// Realistic Cloud page listing: a PDF, a PNG and a spreadsheet.
pub fn sample_listing() -> Vec<Value> {
  vec![
    attachment("att1001", "design-spec.pdf", 24),
    attachment("att1002", "architecture diagram.png", 16),
    attachment("att1003", "budget.xlsx", 8),
  ]
}

pub fn confluence_user() -> ConfluenceUser {
  ConfluenceUser {
    account_id: Some("5b10a2844c20165700ede21g".to_string()),
    email: Some("jane.doe@example.com".to_string()),
    display_name: Some("Jane Doe".to_string()),
    public_name: Some("Jane".to_string()),
    username: None,
  }
}

pub fn jira_user() -> JiraUser {
  JiraUser {
    account_id: Some("5b10a2844c20165700ede21g".to_string()),
    email_address: Some("jane.doe@example.com".to_string()),
    display_name: Some("Jane Doe".to_string()),
    name: None,
  }
}

pub fn unauthorized(endpoint: &str) -> ApiError {
  ApiError::Status {
    status: 401,
    endpoint: endpoint.to_string(),
    body: "Unauthorized".to_string(),
  }
}

pub fn connection_refused(url: &str) -> ApiError {
  ApiError::Transport {
    url: url.to_string(),
    message: "error trying to connect: Connection refused".to_string(),
  }
}
