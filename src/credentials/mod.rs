//! Credential lookup for Atlassian instances.
//!
//! Explicit tokens from flags or environment variables always win; this
//! module supplies the fallback used when they are missing. The default
//! provider reads `~/.netrc`:
//!
//! ```text
//! machine your-instance.atlassian.net
//!   login your.email@example.com
//!   password your-api-token-here
//! ```
//!
//! Atlassian Cloud expects an API token as the password, created at
//! <https://id.atlassian.com/manage-profile/security/api-tokens>.

mod netrc;
mod provider;
mod types;

pub use netrc::NetrcProvider;
pub use provider::CredentialsProvider;
pub use types::{Credential, CredentialError};
