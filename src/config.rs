//! Service configuration resolved from flags, environment variables and
//! `~/.netrc`.
//!
//! A service is configured when its URL is set. Credentials are then taken
//! from, in order: a personal access token, a username plus API token, or the
//! credential provider entry for the URL's host.

use std::fmt;

use anyhow::Result;
use serde::Serialize;
use url::Url;

use crate::atlassian::{Auth, ClientOptions, ConfluenceClient, JiraClient};
use crate::credentials::CredentialsProvider;
use crate::error::ConfigError;

/// Host suffixes that identify Atlassian Cloud instances.
const CLOUD_HOST_SUFFIXES: &[&str] = &[".atlassian.net", ".jira.com", ".jira-dev.com"];

/// The Atlassian products this server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
  Confluence,
  Jira,
}

impl Service {
  /// Display name used in messages.
  pub fn name(self) -> &'static str {
    match self {
      Self::Confluence => "Confluence",
      Self::Jira => "Jira",
    }
  }

  /// Lowercase key used in JSON reports.
  pub fn key(self) -> &'static str {
    match self {
      Self::Confluence => "confluence",
      Self::Jira => "jira",
    }
  }
}

impl fmt::Display for Service {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Hosting flavour of an Atlassian instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
  Cloud,
  Server,
}

impl DeploymentType {
  /// Classify an instance URL. Unparseable URLs count as `Server`.
  pub fn from_url(url: &str) -> Self {
    let host = Url::parse(url)
      .ok()
      .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase));

    match host {
      Some(host) if CLOUD_HOST_SUFFIXES.iter().any(|suffix| host.ends_with(suffix)) => Self::Cloud,
      _ => Self::Server,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Cloud => "cloud",
      Self::Server => "server",
    }
  }
}

/// Where the credentials of a service came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
  /// `*_PERSONAL_TOKEN` flag or environment variable.
  PersonalToken,
  /// `*_USERNAME` and `*_API_TOKEN` flags or environment variables.
  ApiToken,
  /// A credential provider such as `.netrc`, named by the provider.
  Provider(&'static str),
}

impl fmt::Display for CredentialSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::PersonalToken => f.write_str("personal access token"),
      Self::ApiToken => f.write_str("username and API token"),
      Self::Provider(name) => write!(f, "{name}"),
    }
  }
}

/// Raw per-service inputs, as collected from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSettings {
  pub url: Option<String>,
  pub username: Option<String>,
  pub api_token: Option<String>,
  pub personal_token: Option<String>,
  pub ssl_verify: bool,
}

/// A fully resolved, usable service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
  pub service: Service,
  /// Normalised base URL without a trailing slash.
  pub url: String,
  pub auth: Auth,
  pub ssl_verify: bool,
  pub credential_source: CredentialSource,
}

impl ServiceConfig {
  /// Resolve `settings` for `service`.
  ///
  /// # Returns
  /// `Ok(None)` when no URL is set, meaning the service is not configured.
  ///
  /// # Errors
  /// Returns [`ConfigError`] when the URL is invalid, the credential provider
  /// cannot be read, or no credentials can be found.
  pub fn resolve(
    service: Service,
    settings: &ServiceSettings,
    provider: &dyn CredentialsProvider,
  ) -> Result<Option<Self>, ConfigError> {
    let Some(raw_url) = non_empty(settings.url.as_deref()) else {
      return Ok(None);
    };

    let url = normalize_url(raw_url).map_err(|message| ConfigError::InvalidUrl {
      service: service.name(),
      url: raw_url.to_string(),
      message,
    })?;

    let (auth, credential_source) = resolve_auth(service, &url, settings, provider)?;
    tracing::debug!(%service, url, source = %credential_source, auth = auth.kind(), "Resolved service configuration");

    Ok(Some(Self {
      service,
      url,
      auth,
      ssl_verify: settings.ssl_verify,
      credential_source,
    }))
  }

  pub fn deployment_type(&self) -> DeploymentType {
    DeploymentType::from_url(&self.url)
  }

  /// Transport options with this service's TLS setting applied.
  fn client_options(&self, options: &ClientOptions) -> ClientOptions {
    ClientOptions {
      ssl_verify: self.ssl_verify,
      ..options.clone()
    }
  }

  /// Build a Confluence client for this configuration.
  pub fn confluence_client(&self, options: &ClientOptions) -> Result<ConfluenceClient> {
    ConfluenceClient::new(&self.url, self.auth.clone(), &self.client_options(options))
  }

  /// Build a Jira client for this configuration.
  pub fn jira_client(&self, options: &ClientOptions) -> Result<JiraClient> {
    JiraClient::new(&self.url, self.auth.clone(), &self.client_options(options))
  }
}

fn resolve_auth(
  service: Service,
  url: &str,
  settings: &ServiceSettings,
  provider: &dyn CredentialsProvider,
) -> Result<(Auth, CredentialSource), ConfigError> {
  if let Some(token) = non_empty(settings.personal_token.as_deref()) {
    return Ok((Auth::Bearer(token.to_string()), CredentialSource::PersonalToken));
  }

  let username = non_empty(settings.username.as_deref());
  let api_token = non_empty(settings.api_token.as_deref());

  if let (Some(username), Some(token)) = (username, api_token) {
    return Ok((
      Auth::Basic {
        username: username.to_string(),
        token: token.to_string(),
      },
      CredentialSource::ApiToken,
    ));
  }

  let host = Url::parse(url)
    .ok()
    .and_then(|parsed| parsed.host_str().map(str::to_string))
    .unwrap_or_default();

  let credential = provider
    .get_credentials(&host)
    .map_err(|err| ConfigError::Netrc(err.to_string()))?
    .ok_or_else(|| ConfigError::MissingCredentials {
      service: service.name(),
      host: host.clone(),
    })?;

  Ok((
    Auth::Basic {
      username: username.map_or(credential.username, str::to_string),
      token: api_token.map_or(credential.password, str::to_string),
    },
    CredentialSource::Provider(provider.name()),
  ))
}

/// Normalise a base URL: add `https://` when no scheme is present and drop
/// the trailing slash.
///
/// # Errors
/// Returns the parser message when the URL is invalid even with a scheme.
pub fn normalize_url(url: &str) -> Result<String, String> {
  let trimmed = url.trim();

  let parsed = match Url::parse(trimmed) {
    Ok(parsed) if parsed.has_host() => parsed,
    _ => Url::parse(&format!("https://{trimmed}")).map_err(|e| format!("Invalid URL: {e}"))?,
  };

  Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Parse a comma-separated tool allow list. Blank input means "all tools".
pub fn parse_enabled_tools(raw: Option<&str>) -> Option<Vec<String>> {
  let tools: Vec<String> = raw?
    .split(',')
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .map(str::to_string)
    .collect();

  (!tools.is_empty()).then_some(tools)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|value| !value.is_empty())
}

/// Everything the server and commands need at runtime.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub confluence: Option<ServiceConfig>,
  pub jira: Option<ServiceConfig>,
  pub client: ClientOptions,
  /// Concurrent attachment downloads per batch.
  pub parallel: usize,
  /// Tool allow list; `None` enables every available tool.
  pub enabled_tools: Option<Vec<String>>,
}
