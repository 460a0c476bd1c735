//! `atlassian-mcp status`: live connection and authentication check.

use anyhow::Result;

use super::{build_services, load_config};
use crate::cli::Cli;
use crate::color::ColorScheme;
use crate::status::{ConnectionReport, OverallStatus, ServiceStatus, get_connection_status};

/// Check the configured services and print the report.
///
/// # Errors
/// Fails when configuration cannot be resolved or clients cannot be built,
/// or when the overall status is `unavailable`.
pub(crate) async fn handle_status_command(json: bool, cli: &Cli, colors: &ColorScheme) -> Result<()> {
  let config = load_config(cli)?;
  let services = build_services(&config)?;

  let report = get_connection_status(
    services.confluence.as_ref().map(|handle| handle.api.as_ref()),
    services.jira.as_deref(),
  )
  .await;

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print_report(&report, colors);
  }

  if report.overall_status == OverallStatus::Unavailable {
    anyhow::bail!("No configured service is reachable and authenticated");
  }
  Ok(())
}

fn print_report(report: &ConnectionReport, colors: &ColorScheme) {
  println!(
    "{}: {}",
    colors.emphasis("Overall status"),
    colors.overall(report.overall_status)
  );

  if report.services.is_empty() {
    println!(
      "\n{} No services configured. Set CONFLUENCE_URL and/or JIRA_URL.",
      colors.warning("⚠")
    );
    return;
  }

  for (name, status) in &report.services {
    print_service(name, status, colors);
  }

  println!("\n{}", colors.dimmed(&report.timestamp));
}

fn print_service(name: &str, status: &ServiceStatus, colors: &ColorScheme) {
  println!("\n{} {}", colors.mark(status.is_healthy()), colors.emphasis(name));

  if let Some(url) = &status.url {
    println!("  {}: {}", colors.dimmed("URL"), colors.link(url));
  }
  if let Some(deployment) = status.deployment_type {
    println!("  {}: {}", colors.dimmed("Deployment"), deployment.as_str());
  }
  println!("  {}: {}", colors.dimmed("Connected"), colors.mark(status.connected));
  println!("  {}: {}", colors.dimmed("Authenticated"), colors.mark(status.authenticated));
  if let Some(user) = &status.authenticated_user {
    println!("  {}: {}", colors.dimmed("User"), user);
  }
  if let Some(error) = &status.error {
    println!("  {}: {}", colors.dimmed("Error"), colors.error(error));
  }
}
