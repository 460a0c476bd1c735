//! Typed view of a single attachment payload.
//!
//! Cloud and Server/Data Center emit different link structures for the same
//! attachment; [`Attachment`] normalises both into one record with a single
//! resolvable download URL.

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Top-level payload keys that are interpreted by [`Attachment::from_api_response`].
const KNOWN_KEYS: &[&str] = &["id", "type", "status", "title", "extensions", "_links", "_expandable"];

/// Attachment metadata parsed from a Confluence API response.
///
/// Unknown top-level fields are preserved in `additional_properties` and
/// written back out, flattened, when the record is serialised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attachment {
  /// Opaque attachment identifier.
  pub id: Option<String>,
  /// Content type reported by the API (usually `"attachment"`).
  #[serde(rename = "type")]
  pub content_type: Option<String>,
  /// Lifecycle status such as `"current"`.
  pub status: Option<String>,
  /// Display name, used as the on-disk filename.
  pub title: Option<String>,
  /// MIME type from `extensions.mediaType`.
  pub media_type: Option<String>,
  /// Byte count from `extensions.fileSize`.
  pub file_size: Option<u64>,
  /// Absolute URL candidate from `_links.self`.
  pub download_url: Option<String>,
  /// Server-relative path from `_links.download`.
  pub relative_path: Option<String>,
  /// Payload fields this record does not interpret.
  #[serde(flatten)]
  pub additional_properties: Map<String, Value>,
}

impl Attachment {
  /// Build an attachment from one entry of an attachment listing.
  ///
  /// Missing or mistyped fields become `None`; this never fails. A payload
  /// that is not a JSON object yields an empty attachment.
  pub fn from_api_response(data: &Value) -> Self {
    let Some(object) = data.as_object() else {
      return Self::default();
    };

    let links = object.get("_links");
    let extensions = object.get("extensions");

    let relative_path = string_at(links, "download");
    let download_url = string_at(links, "self");

    tracing::debug!(
      ?download_url,
      ?relative_path,
      "Extracted attachment links"
    );

    let additional_properties = object
      .iter()
      .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect();

    Self {
      id: string_at(Some(data), "id"),
      content_type: string_at(Some(data), "type"),
      status: string_at(Some(data), "status"),
      title: string_at(Some(data), "title"),
      media_type: string_at(extensions, "mediaType"),
      file_size: extensions.and_then(|ext| ext.get("fileSize")).and_then(Value::as_u64),
      download_url,
      relative_path,
      additional_properties,
    }
  }

  /// Full download URL for this attachment, if one can be resolved.
  ///
  /// A non-empty `relative_path` always wins and is appended verbatim to
  /// `base_url` (trailing slashes trimmed). Otherwise `download_url` is used
  /// when it is an `http(s)` URL. The `_links.self` value this falls back to
  /// is the REST resource of the attachment, which is not always the file
  /// itself.
  pub fn download_url(&self, base_url: &str) -> Option<String> {
    if let Some(relative) = self.relative_path.as_deref().filter(|path| !path.is_empty()) {
      return Some(format!("{}{}", base_url.trim_end_matches('/'), relative));
    }

    if let Some(url) = self.download_url.as_deref().filter(|url| url.starts_with("http")) {
      tracing::debug!(url, "Falling back to self link for attachment download");
      return Some(url.to_string());
    }

    None
  }

  /// Compact JSON view used in diagnostics. `download_url` holds the
  /// unresolved link (relative path or self link).
  pub fn summary(&self) -> Value {
    json!({
      "id": self.id,
      "type": self.content_type,
      "status": self.status,
      "title": self.title,
      "media_type": self.media_type,
      "file_size": self.file_size,
      "download_url": self.download_url(""),
    })
  }
}

fn string_at(parent: Option<&Value>, key: &str) -> Option<String> {
  parent
    .and_then(|value| value.get(key))
    .and_then(Value::as_str)
    .map(str::to_string)
}
