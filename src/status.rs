//! Connection checks for the configured Atlassian services.
//!
//! Each check calls the identity endpoint of its service; the report
//! aggregates only the services that are configured.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::atlassian::{ConfluenceApi, JiraApi};
use crate::config::{DeploymentType, Service};
use crate::error::ApiError;

/// Connection state of one service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
  pub configured: bool,
  /// The server produced an HTTP response.
  pub connected: bool,
  /// The identity endpoint accepted the credentials.
  pub authenticated: bool,
  pub url: Option<String>,
  pub deployment_type: Option<DeploymentType>,
  pub authenticated_user: Option<String>,
  pub error: Option<String>,
  /// Always `None`: only OAuth tokens expire, and OAuth is not supported.
  pub token_expiry: Option<String>,
}

impl ServiceStatus {
  fn unconfigured(service: Service) -> Self {
    Self {
      error: Some(format!(
        "{service} client not available. Ensure server is configured correctly."
      )),
      ..Self::default()
    }
  }

  fn for_url(url: &str) -> Self {
    Self {
      configured: true,
      url: Some(url.to_string()),
      deployment_type: Some(DeploymentType::from_url(url)),
      ..Self::default()
    }
  }

  fn fail(mut self, service: Service, err: &ApiError) -> Self {
    if err.is_transport() {
      self.error = Some(format!("{service} connection failed: {err}"));
    } else {
      self.connected = true;
      self.error = Some(format!("{service} token validation failed: {err}"));
    }
    self
  }

  fn succeed(mut self, user: Option<String>) -> Self {
    self.connected = true;
    self.authenticated = true;
    self.authenticated_user = user;
    self
  }

  /// Connected and authenticated.
  pub fn is_healthy(&self) -> bool {
    self.connected && self.authenticated
  }
}

/// Aggregate health across configured services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
  /// Every configured service is healthy.
  Healthy,
  /// Some, but not all, configured services are healthy.
  Degraded,
  /// Nothing is configured, or no configured service is healthy.
  Unavailable,
}

impl OverallStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Healthy => "healthy",
      Self::Degraded => "degraded",
      Self::Unavailable => "unavailable",
    }
  }
}

/// Result of `get_connection_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
  pub overall_status: OverallStatus,
  /// Configured services keyed by `confluence` / `jira`.
  pub services: BTreeMap<String, ServiceStatus>,
  /// RFC 3339 UTC time the report was produced.
  pub timestamp: String,
}

impl ConnectionReport {
  /// Build a report from individual checks, dropping unconfigured services.
  pub fn from_checks(checks: impl IntoIterator<Item = (Service, ServiceStatus)>) -> Self {
    let services: BTreeMap<String, ServiceStatus> = checks
      .into_iter()
      .filter(|(_, status)| status.configured)
      .map(|(service, status)| (service.key().to_string(), status))
      .collect();

    let healthy = services.values().filter(|status| status.is_healthy()).count();
    let overall_status = match healthy {
      0 => OverallStatus::Unavailable,
      n if n == services.len() => OverallStatus::Healthy,
      _ => OverallStatus::Degraded,
    };

    Self {
      overall_status,
      services,
      timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
  }
}

/// Check Confluence credentials against `/rest/api/user/current`.
pub async fn check_confluence_connection_status(api: Option<&dyn ConfluenceApi>) -> ServiceStatus {
  let Some(api) = api else {
    return ServiceStatus::unconfigured(Service::Confluence);
  };

  let status = ServiceStatus::for_url(api.base_url());
  match api.current_user().await {
    Ok(user) => status.succeed(user.identity()),
    Err(err) => {
      tracing::warn!(error = %err, "Confluence connection check failed");
      status.fail(Service::Confluence, &err)
    }
  }
}

/// Check Jira credentials against `/rest/api/2/myself`.
pub async fn check_jira_connection_status(api: Option<&dyn JiraApi>) -> ServiceStatus {
  let Some(api) = api else {
    return ServiceStatus::unconfigured(Service::Jira);
  };

  let status = ServiceStatus::for_url(api.base_url());
  match api.current_user().await {
    Ok(user) => status.succeed(user.identity()),
    Err(err) => {
      tracing::warn!(error = %err, "Jira connection check failed");
      status.fail(Service::Jira, &err)
    }
  }
}

/// Check both services concurrently and aggregate the result.
pub async fn get_connection_status(
  confluence: Option<&dyn ConfluenceApi>,
  jira: Option<&dyn JiraApi>,
) -> ConnectionReport {
  let (confluence, jira) = tokio::join!(
    check_confluence_connection_status(confluence),
    check_jira_connection_status(jira)
  );

  ConnectionReport::from_checks([(Service::Jira, jira), (Service::Confluence, confluence)])
}

#[cfg(test)]
mod tests {
  use super::*;

  fn healthy(url: &str) -> ServiceStatus {
    ServiceStatus::for_url(url).succeed(Some("user@example.com".to_string()))
  }

  fn unauthorized(service: Service, url: &str) -> ServiceStatus {
    ServiceStatus::for_url(url).fail(
      service,
      &ApiError::Status {
        status: 401,
        endpoint: "/rest/api/user/current".to_string(),
        body: "Unauthorized".to_string(),
      },
    )
  }

  #[test]
  fn both_healthy_is_healthy() {
    let report = ConnectionReport::from_checks([
      (Service::Jira, healthy("https://test.atlassian.net")),
      (Service::Confluence, healthy("https://test.atlassian.net/wiki")),
    ]);

    assert_eq!(report.overall_status, OverallStatus::Healthy);
    assert_eq!(report.services.len(), 2);
    assert_eq!(
      report.services["confluence"].deployment_type,
      Some(DeploymentType::Cloud)
    );
  }

  #[test]
  fn unconfigured_service_is_excluded() {
    let report = ConnectionReport::from_checks([
      (Service::Jira, healthy("https://test.atlassian.net")),
      (Service::Confluence, ServiceStatus::unconfigured(Service::Confluence)),
    ]);

    assert_eq!(report.overall_status, OverallStatus::Healthy);
    assert!(report.services.contains_key("jira"));
    assert!(!report.services.contains_key("confluence"));
  }

  #[test]
  fn nothing_configured_is_unavailable() {
    let report = ConnectionReport::from_checks([
      (Service::Jira, ServiceStatus::unconfigured(Service::Jira)),
      (Service::Confluence, ServiceStatus::unconfigured(Service::Confluence)),
    ]);

    assert_eq!(report.overall_status, OverallStatus::Unavailable);
    assert!(report.services.is_empty());
  }

  #[test]
  fn mixed_results_are_degraded() {
    let report = ConnectionReport::from_checks([
      (Service::Jira, healthy("https://jira.example.com")),
      (
        Service::Confluence,
        unauthorized(Service::Confluence, "https://test.atlassian.net/wiki"),
      ),
    ]);

    assert_eq!(report.overall_status, OverallStatus::Degraded);
  }

  #[test]
  fn status_error_counts_as_connected_but_unauthenticated() {
    let status = unauthorized(Service::Confluence, "https://test.atlassian.net/wiki");

    assert!(status.connected);
    assert!(!status.authenticated);
    assert_eq!(
      status.error.as_deref(),
      Some("Confluence token validation failed: 401 from /rest/api/user/current: Unauthorized")
    );
  }

  #[test]
  fn transport_error_is_not_connected() {
    let status = ServiceStatus::for_url("https://test.atlassian.net").fail(
      Service::Jira,
      &ApiError::Transport {
        url: "https://test.atlassian.net/rest/api/2/myself".to_string(),
        message: "Connection timeout".to_string(),
      },
    );

    assert!(!status.connected);
    assert!(status.error.unwrap().contains("timeout"));
  }

  #[test]
  fn report_serializes_lowercase_status_and_null_expiry() {
    let report = ConnectionReport::from_checks([(Service::Jira, healthy("https://test.atlassian.net"))]);
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["overall_status"], "healthy");
    assert_eq!(value["services"]["jira"]["deployment_type"], "cloud");
    assert!(value["services"]["jira"]["token_expiry"].is_null());
    assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
  }
}
