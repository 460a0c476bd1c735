//! Credential values and lookup errors.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Login and secret found for a host.
///
/// `Debug` output never includes the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
  /// Login name (an email address on Atlassian Cloud).
  pub username: String,
  /// API token or password.
  pub password: String,
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credential")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// Errors raised while reading a credential source.
#[derive(Debug, Error)]
pub enum CredentialError {
  /// No home directory could be determined.
  #[error("home directory not found")]
  NoHome,

  /// The credential file exists but could not be read.
  #[error("failed to read {path}: {source}")]
  Io {
    /// File being read.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_redacts_password() {
    let credential = Credential {
      username: "user@example.com".to_string(),
      password: "api-token-123".to_string(),
    };

    let rendered = format!("{credential:?}");
    assert!(rendered.contains("user@example.com"));
    assert!(!rendered.contains("api-token-123"));
  }

  #[test]
  fn io_error_mentions_path() {
    let err = CredentialError::Io {
      path: PathBuf::from("/home/me/.netrc"),
      source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
    };
    assert!(err.to_string().contains("/home/me/.netrc"));
    assert!(std::error::Error::source(&err).is_some());
  }
}
