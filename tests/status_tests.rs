//! Connection status aggregation against fake Confluence and Jira clients.

mod common;

use atlassian_mcp::config::DeploymentType;
use atlassian_mcp::status::{OverallStatus, check_confluence_connection_status, get_connection_status};
use common::fake_atlassian::{FakeConfluence, FakeJira};
use common::fixtures::{self, CLOUD_BASE};

#[tokio::test]
async fn test_both_services_healthy() {
  let confluence = FakeConfluence::new(CLOUD_BASE);
  let jira = FakeJira::new("https://example.atlassian.net");

  let report = get_connection_status(Some(&confluence), Some(&jira)).await;

  assert_eq!(report.overall_status, OverallStatus::Healthy);
  assert_eq!(report.services.len(), 2);

  let confluence_status = &report.services["confluence"];
  assert!(confluence_status.connected);
  assert!(confluence_status.authenticated);
  assert_eq!(confluence_status.authenticated_user.as_deref(), Some("jane.doe@example.com"));
  assert_eq!(confluence_status.deployment_type, Some(DeploymentType::Cloud));
  assert_eq!(confluence_status.token_expiry, None);
}

#[tokio::test]
async fn test_only_jira_configured() {
  let jira = FakeJira::new("https://jira.internal.example.com");

  let report = get_connection_status(None, Some(&jira)).await;

  assert_eq!(report.overall_status, OverallStatus::Healthy);
  assert!(!report.services.contains_key("confluence"));
  assert_eq!(report.services["jira"].deployment_type, Some(DeploymentType::Server));
}

#[tokio::test]
async fn test_nothing_configured() {
  let report = get_connection_status(None, None).await;

  assert_eq!(report.overall_status, OverallStatus::Unavailable);
  assert!(report.services.is_empty());
}

#[tokio::test]
async fn test_unconfigured_confluence_check_explains_itself() {
  let status = check_confluence_connection_status(None).await;

  assert!(!status.configured);
  assert_eq!(
    status.error.as_deref(),
    Some("Confluence client not available. Ensure server is configured correctly.")
  );
}

#[tokio::test]
async fn test_all_configured_services_failing() {
  let confluence = FakeConfluence::new(CLOUD_BASE).with_user(Err(fixtures::unauthorized("/rest/api/user/current")));
  let jira = FakeJira::new("https://example.atlassian.net")
    .with_user(Err(fixtures::connection_refused("https://example.atlassian.net/rest/api/2/myself")));

  let report = get_connection_status(Some(&confluence), Some(&jira)).await;

  assert_eq!(report.overall_status, OverallStatus::Unavailable);

  let confluence_status = &report.services["confluence"];
  assert!(confluence_status.connected);
  assert!(!confluence_status.authenticated);
  assert!(confluence_status.error.as_deref().unwrap().contains("401"));

  let jira_status = &report.services["jira"];
  assert!(!jira_status.connected);
  assert!(!jira_status.authenticated);
  assert!(jira_status.error.as_deref().unwrap().starts_with("Jira connection failed"));
}

#[tokio::test]
async fn test_mixed_results_are_degraded() {
  let confluence = FakeConfluence::new(CLOUD_BASE);
  let jira = FakeJira::new("https://example.atlassian.net").with_user(Err(fixtures::unauthorized("/rest/api/2/myself")));

  let report = get_connection_status(Some(&confluence), Some(&jira)).await;

  assert_eq!(report.overall_status, OverallStatus::Degraded);
  assert!(report.services["confluence"].is_healthy());
  assert!(!report.services["jira"].is_healthy());
}
