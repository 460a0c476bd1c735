//! Authenticated REST plumbing shared by the Confluence and Jira clients.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;
use url::Url;

use super::api::{ByteStream, FetchSession};
use crate::error::ApiError;

/// How requests authenticate against an Atlassian instance.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
  /// Email/username plus API token, sent as HTTP Basic.
  Basic { username: String, token: String },
  /// Personal access token (Server/Data Center), sent as a Bearer token.
  Bearer(String),
}

impl Auth {
  /// Value for the `Authorization` header.
  fn header_value(&self) -> String {
    match self {
      Self::Basic { username, token } => {
        let credentials = format!("{username}:{token}");
        format!("Basic {}", BASE64.encode(credentials.as_bytes()))
      }
      Self::Bearer(token) => format!("Bearer {token}"),
    }
  }

  /// Short label for diagnostics; never includes the secret.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Basic { .. } => "basic",
      Self::Bearer(_) => "personal token",
    }
  }
}

impl std::fmt::Debug for Auth {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Basic { username, .. } => f.debug_struct("Basic").field("username", username).finish_non_exhaustive(),
      Self::Bearer(_) => f.write_str("Bearer(..)"),
    }
  }
}

/// Transport tuning shared by every client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
  /// Request timeout in seconds.
  pub timeout_secs: u64,
  /// Maximum requests per second.
  pub rate_limit: usize,
  /// Verify TLS certificates.
  pub ssl_verify: bool,
}

impl Default for ClientOptions {
  fn default() -> Self {
    Self {
      timeout_secs: 30,
      rate_limit: 10,
      ssl_verify: true,
    }
  }
}

/// Simple fixed-window rate limiter to cap the number of requests per interval.
#[derive(Debug)]
struct RequestRateLimiter {
  max_requests: usize,
  window: Duration,
  timestamps: Mutex<VecDeque<Instant>>,
}

impl RequestRateLimiter {
  fn new(max_requests: usize, window: Duration) -> Self {
    Self {
      max_requests,
      window,
      timestamps: Mutex::new(VecDeque::with_capacity(max_requests)),
    }
  }

  /// Wait until the caller can perform another request without exceeding the
  /// rate limit.
  async fn acquire(&self) {
    loop {
      let mut timestamps = self.timestamps.lock().await;
      let now = Instant::now();

      while let Some(earliest) = timestamps.front()
        && now.duration_since(*earliest) >= self.window
      {
        timestamps.pop_front();
      }

      if timestamps.len() < self.max_requests {
        timestamps.push_back(now);
        return;
      }

      let wait_duration = match timestamps.front() {
        Some(earliest) => self.window.saturating_sub(now.duration_since(*earliest)),
        None => Duration::ZERO,
      };

      drop(timestamps);

      if !wait_duration.is_zero() {
        sleep(wait_duration).await;
      }
    }
  }
}

/// Authenticated, rate-limited HTTP client bound to one instance.
#[derive(Clone)]
pub struct RestClient {
  base_url: String,
  auth: Auth,
  client: reqwest::Client,
  rate_limiter: Arc<RequestRateLimiter>,
}

impl RestClient {
  /// Create a client for `base_url`.
  ///
  /// # Errors
  /// Returns an error if the rate limit is zero or if the underlying
  /// `reqwest::Client` cannot be built.
  pub fn new(base_url: impl Into<String>, auth: Auth, options: &ClientOptions) -> Result<Self> {
    if options.rate_limit == 0 {
      return Err(anyhow!("Rate limit must be at least 1 request per second"));
    }

    let base_url = base_url.into().trim_end_matches('/').to_string();

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(options.timeout_secs))
      .danger_accept_invalid_certs(!options.ssl_verify)
      .user_agent(format!(
        "atlassian-mcp/{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("TARGET")
      ))
      .build()
      .context("Failed to create HTTP client")?;

    Ok(Self {
      base_url,
      auth,
      client,
      rate_limiter: Arc::new(RequestRateLimiter::new(options.rate_limit, Duration::from_secs(1))),
    })
  }

  /// Instance root URL without a trailing slash.
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// GET `path` (relative to the base URL) and decode the JSON body.
  pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    let url = format!("{}{}", self.base_url, path);
    let response = self.send_get(&url, path, true).await?;

    response.json::<T>().await.map_err(|err| ApiError::decode(path, err))
  }

  /// Issue an authenticated GET and turn non-success statuses into errors.
  async fn send_get(&self, url: &str, endpoint: &str, json: bool) -> Result<reqwest::Response, ApiError> {
    self.rate_limiter.acquire().await;

    let mut request = self.client.get(url);
    if self.is_instance_url(url) {
      request = request.header("Authorization", self.auth.header_value());
    } else {
      tracing::debug!(url, "Sending request to another origin without credentials");
    }
    if json {
      request = request.header("Accept", "application/json");
    }

    let response = request.send().await.map_err(|err| ApiError::transport(url, &err))?;

    let status = response.status();
    if !status.is_success() {
      let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("(no error details)"));
      return Err(ApiError::Status {
        status: status.as_u16(),
        endpoint: endpoint.to_string(),
        body,
      });
    }

    Ok(response)
  }

  /// Whether `url` has the same scheme, host and port as the base URL.
  /// Credentials are only ever sent to such URLs.
  fn is_instance_url(&self, url: &str) -> bool {
    match (Url::parse(&self.base_url), Url::parse(url)) {
      (Ok(base), Ok(target)) => base.origin() == target.origin(),
      _ => false,
    }
  }

  /// Resolve a possibly relative link against the base URL.
  fn resolve_url(&self, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
      return url.to_string();
    }

    if url.starts_with('/') {
      return format!("{}{}", self.base_url, url);
    }

    format!("{}/{}", self.base_url, url)
  }
}

#[async_trait]
impl FetchSession for RestClient {
  async fn fetch(&self, url: &str) -> Result<ByteStream, ApiError> {
    let full_url = self.resolve_url(url);
    let response = self.send_get(&full_url, &full_url, false).await?;

    let stream = response.bytes_stream().map(move |chunk| {
      chunk
        .map(|bytes| bytes.to_vec())
        .map_err(|err| ApiError::transport(&full_url, &err))
    });

    Ok(stream.boxed())
  }
}
