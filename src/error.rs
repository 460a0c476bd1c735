//! Error types shared by the Atlassian clients and the attachment core.
//!
//! Listing and identity calls surface [`ApiError`]; per-file download
//! failures surface [`DownloadError`] and are recovered by the batch
//! operation. [`ConfigError`] covers service configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to a REST endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
  /// The request never produced a response (DNS, TLS, timeout, reset).
  #[error("failed to reach {url}: {message}")]
  Transport {
    /// URL that was requested.
    url: String,
    /// Underlying transport error rendered as text.
    message: String,
  },

  /// The server answered with a non-success status code.
  #[error("{status} from {endpoint}: {body}")]
  Status {
    /// HTTP status code.
    status: u16,
    /// Path (or URL) that produced the status.
    endpoint: String,
    /// Response body, or a placeholder when it could not be read.
    body: String,
  },

  /// A page ID that would not form a safe REST path; no request was sent.
  #[error("invalid page ID '{0}': expected a numeric identifier")]
  InvalidPageId(String),

  /// The response body could not be decoded.
  #[error("failed to decode response from {endpoint}: {message}")]
  Decode {
    /// Path (or URL) whose body failed to decode.
    endpoint: String,
    /// Decoder error rendered as text.
    message: String,
  },
}

impl ApiError {
  /// Returns `true` when no HTTP response was received at all.
  pub fn is_transport(&self) -> bool {
    matches!(self, Self::Transport { .. })
  }

  /// HTTP status code, when the server responded.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Status { status, .. } => Some(*status),
      _ => None,
    }
  }

  /// Returns `true` for 401 and 403 responses.
  pub fn is_auth_failure(&self) -> bool {
    matches!(self.status(), Some(401 | 403))
  }

  pub(crate) fn transport(url: &str, err: &reqwest::Error) -> Self {
    Self::Transport {
      url: url.to_string(),
      message: err.to_string(),
    }
  }

  pub(crate) fn decode(endpoint: &str, err: impl std::fmt::Display) -> Self {
    Self::Decode {
      endpoint: endpoint.to_string(),
      message: err.to_string(),
    }
  }
}

/// Failure downloading a single attachment to disk.
#[derive(Debug, Error)]
pub enum DownloadError {
  /// The caller supplied an empty URL.
  #[error("no URL provided for attachment download")]
  MissingUrl,

  /// The HTTP request or the body stream failed.
  #[error(transparent)]
  Fetch(#[from] ApiError),

  /// Creating directories or writing the file failed.
  #[error("failed to write {path}: {source}")]
  Io {
    /// Path being written.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },

  /// The write completed but the file is not on disk.
  #[error("file was not created at {0}")]
  NotCreated(PathBuf),
}

/// Failure of a whole batch download, before any per-file work starts.
#[derive(Debug, Error)]
pub enum BatchError {
  /// The attachment listing could not be fetched; passed through unchanged.
  #[error(transparent)]
  Listing(#[from] ApiError),

  /// The target directory could not be created.
  #[error("failed to create target directory {path}: {source}")]
  TargetDir {
    /// Directory being created.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },
}

/// Failure resolving a service configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  /// The base URL could not be parsed.
  #[error("invalid {service} URL '{url}': {message}")]
  InvalidUrl {
    /// Service name (`Confluence` or `Jira`).
    service: &'static str,
    /// URL as supplied.
    url: String,
    /// Parser message.
    message: String,
  },

  /// A URL was configured but no usable credentials were found.
  #[error(
    "{service} credentials not found. Provide a personal token, a username and API token, or add {host} to ~/.netrc"
  )]
  MissingCredentials {
    /// Service name (`Confluence` or `Jira`).
    service: &'static str,
    /// Host looked up in `.netrc`.
    host: String,
  },

  /// The `.netrc` file exists but could not be read.
  #[error("failed to read ~/.netrc: {0}")]
  Netrc(String),

  /// A numeric option is out of range.
  #[error("{0}")]
  Invalid(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_error_mentions_code_and_endpoint() {
    let err = ApiError::Status {
      status: 401,
      endpoint: "/rest/api/user/current".to_string(),
      body: "Unauthorized".to_string(),
    };

    let message = err.to_string();
    assert!(message.contains("401"));
    assert!(message.contains("/rest/api/user/current"));
    assert_eq!(err.status(), Some(401));
    assert!(!err.is_transport());
  }

  #[test]
  fn transport_error_has_no_status() {
    let err = ApiError::Transport {
      url: "https://example.atlassian.net".to_string(),
      message: "Connection timeout".to_string(),
    };

    assert!(err.is_transport());
    assert_eq!(err.status(), None);
    assert!(err.to_string().contains("Connection timeout"));
  }

  #[test]
  fn download_error_wraps_api_error_transparently() {
    let api = ApiError::Status {
      status: 404,
      endpoint: "/download/attachments/1/a.png".to_string(),
      body: "missing".to_string(),
    };
    let err = DownloadError::from(api.clone());
    assert_eq!(err.to_string(), api.to_string());
  }
}
