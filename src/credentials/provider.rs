//! Pluggable credential sources.

use super::{Credential, CredentialError};

/// A source of credentials keyed by host name.
pub trait CredentialsProvider: Send + Sync {
  /// Look up credentials for `host` (e.g. `example.atlassian.net`).
  ///
  /// # Returns
  /// * `Ok(Some(_))` when the source has an entry for the host.
  /// * `Ok(None)` when it has none, so the caller can report missing
  ///   credentials.
  ///
  /// # Errors
  /// Returns [`CredentialError`] when the source exists but cannot be read.
  fn get_credentials(&self, host: &str) -> Result<Option<Credential>, CredentialError>;

  /// Short label used when reporting where credentials came from.
  fn name(&self) -> &'static str;
}
