//! Tool definitions, argument types and result envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DOWNLOAD_ATTACHMENTS: &str = "confluence_download_attachments";
pub const DOWNLOAD_ATTACHMENT: &str = "confluence_download_attachment";
pub const CONNECTION_STATUS: &str = "get_connection_status";

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
  pub name: &'static str,
  pub description: &'static str,
  pub input_schema: Value,
  /// Tools that need a configured Confluence instance.
  #[serde(skip)]
  pub requires_confluence: bool,
}

/// Parameters of a `tools/call` request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
  pub name: String,
  #[serde(default)]
  pub arguments: Value,
}

/// One content block of a tool result.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
  Text { text: String },
}

/// Result of a tool call. Tool failures are reported here with
/// `isError: true`, not as JSON-RPC errors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
  pub content: Vec<ToolContent>,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub is_error: bool,
}

impl ToolCallResult {
  pub fn text(text: impl Into<String>) -> Self {
    Self {
      content: vec![ToolContent::Text { text: text.into() }],
      is_error: false,
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      content: vec![ToolContent::Text { text: message.into() }],
      is_error: true,
    }
  }

  /// Pretty-printed JSON payload; a serialization failure becomes an error
  /// result.
  pub fn json<T: Serialize>(value: &T) -> Self {
    match serde_json::to_string_pretty(value) {
      Ok(text) => Self::text(text),
      Err(err) => Self::error(format!("Failed to serialize result: {err}")),
    }
  }

  /// First text block, if any.
  pub fn first_text(&self) -> Option<&str> {
    self.content.iter().map(|ToolContent::Text { text }| text.as_str()).next()
  }
}

/// Arguments of `confluence_download_attachments`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadAttachmentsArgs {
  pub page_id: String,
  pub target_dir: String,
}

/// Arguments of `confluence_download_attachment`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadAttachmentArgs {
  pub url: String,
  pub target_path: String,
}

/// Every tool this server knows, in listing order.
pub fn all_tools() -> Vec<ToolDefinition> {
  vec![
    ToolDefinition {
      name: DOWNLOAD_ATTACHMENTS,
      description: "Download every attachment of a Confluence page into a local directory. \
                    Returns per-file results; one failed file does not stop the others.",
      input_schema: json!({
        "type": "object",
        "properties": {
          "page_id": {
            "type": "string",
            "description": "Numeric ID of the Confluence page"
          },
          "target_dir": {
            "type": "string",
            "description": "Directory to save attachments into (created if missing)"
          }
        },
        "required": ["page_id", "target_dir"]
      }),
      requires_confluence: true,
    },
    ToolDefinition {
      name: DOWNLOAD_ATTACHMENT,
      description: "Download a single Confluence attachment by URL to a local file path.",
      input_schema: json!({
        "type": "object",
        "properties": {
          "url": {
            "type": "string",
            "description": "Absolute download URL, or a path relative to the Confluence base URL"
          },
          "target_path": {
            "type": "string",
            "description": "File path to write (parent directories are created)"
          }
        },
        "required": ["url", "target_path"]
      }),
      requires_confluence: true,
    },
    ToolDefinition {
      name: CONNECTION_STATUS,
      description: "Report whether Jira and Confluence are configured, reachable and authenticated.",
      input_schema: json!({
        "type": "object",
        "properties": {}
      }),
      requires_confluence: false,
    },
  ]
}

/// Tools to advertise given the configured services and the optional allow
/// list.
pub fn available_tools(confluence_configured: bool, enabled: Option<&[String]>) -> Vec<ToolDefinition> {
  all_tools()
    .into_iter()
    .filter(|tool| confluence_configured || !tool.requires_confluence)
    .filter(|tool| enabled.is_none_or(|names| names.iter().any(|name| name == tool.name)))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(tools: &[ToolDefinition]) -> Vec<&'static str> {
    tools.iter().map(|tool| tool.name).collect()
  }

  #[test]
  fn confluence_tools_hidden_without_confluence() {
    assert_eq!(names(&available_tools(false, None)), [CONNECTION_STATUS]);
    assert_eq!(names(&available_tools(true, None)).len(), 3);
  }

  #[test]
  fn allow_list_filters_tools() {
    let enabled = vec![DOWNLOAD_ATTACHMENTS.to_string()];
    assert_eq!(names(&available_tools(true, Some(&enabled))), [DOWNLOAD_ATTACHMENTS]);
  }

  #[test]
  fn definitions_serialize_camel_case_without_internal_flags() {
    let value = serde_json::to_value(&all_tools()[0]).unwrap();
    assert!(value.get("inputSchema").is_some());
    assert!(value.get("requires_confluence").is_none());
  }

  #[test]
  fn error_results_carry_is_error_flag() {
    let value = serde_json::to_value(ToolCallResult::error("boom")).unwrap();
    assert_eq!(value["isError"], true);
    assert_eq!(value["content"][0]["type"], "text");

    let value = serde_json::to_value(ToolCallResult::text("ok")).unwrap();
    assert!(value.get("isError").is_none());
  }
}
