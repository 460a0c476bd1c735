//! `atlassian-mcp auth show`: print the resolved credentials of each service
//! without revealing secrets.

use anyhow::Result;

use crate::atlassian::Auth;
use crate::cli::{AuthCommand, Cli};
use crate::color::ColorScheme;
use crate::config::{Service, ServiceConfig, ServiceSettings};
use crate::credentials::NetrcProvider;

/// Dispatch the `auth` subcommands.
pub(crate) fn handle_auth_command(subcommand: &AuthCommand, cli: &Cli, colors: &ColorScheme) -> Result<()> {
  match subcommand {
    AuthCommand::Show => {
      show_auth_config(cli, colors);
      Ok(())
    }
  }
}

/// Print one block per service. Resolution errors are shown inline so that a
/// broken Jira setup does not hide the Confluence one.
fn show_auth_config(cli: &Cli, colors: &ColorScheme) {
  println!("{}", colors.emphasis("Authentication Configuration"));

  let provider = NetrcProvider::new();
  let services = [
    (Service::Confluence, cli.confluence.settings()),
    (Service::Jira, cli.jira.settings()),
  ];

  let mut configured = 0;
  for (service, settings) in &services {
    println!("\n{}", colors.emphasis(service));
    match ServiceConfig::resolve(*service, settings, &provider) {
      Ok(Some(config)) => {
        configured += 1;
        print_service(&config, colors);
      }
      Ok(None) => print_unconfigured(*service, settings, colors),
      Err(err) => {
        println!("  {} {}", colors.error("✗"), colors.error(&err));
      }
    }
  }

  if configured == 0 {
    println!(
      "\n{} No services configured. Set CONFLUENCE_URL and/or JIRA_URL, then provide\n  \
       a personal token, a username and API token, or a ~/.netrc entry.",
      colors.warning("⚠")
    );
  }
}

fn print_service(config: &ServiceConfig, colors: &ColorScheme) {
  println!("  {}: {}", colors.dimmed("URL"), colors.link(&config.url));
  println!("  {}: {}", colors.dimmed("Deployment"), config.deployment_type().as_str());
  println!("  {}: {}", colors.dimmed("Source"), config.credential_source);

  match &config.auth {
    Auth::Basic { username, token } => {
      println!("  {}: {}", colors.dimmed("Username"), username);
      println!("  {}: {}", colors.dimmed("API token"), colors.dimmed(mask_secret(token)));
    }
    Auth::Bearer(token) => {
      println!("  {}: {}", colors.dimmed("Personal token"), colors.dimmed(mask_secret(token)));
    }
  }

  if !config.ssl_verify {
    println!("  {} TLS certificate verification is disabled", colors.warning("⚠"));
  }
  println!("  {} {}", colors.success("✓"), colors.success("Credentials configured"));
}

fn print_unconfigured(service: Service, settings: &ServiceSettings, colors: &ColorScheme) {
  println!("  {}: {}", colors.dimmed("URL"), colors.dimmed("(not set)"));

  let has_credentials = settings.personal_token.is_some() || settings.username.is_some() || settings.api_token.is_some();
  if has_credentials {
    println!(
      "  {} Credentials are set but {}_URL is missing",
      colors.warning("⚠"),
      service.key().to_uppercase()
    );
  }
}

/// Keep the first four characters of long secrets and star out the rest.
fn mask_secret(secret: &str) -> String {
  let len = secret.chars().count();
  if len > 8 {
    let prefix: String = secret.chars().take(4).collect();
    format!("{prefix}{}", "*".repeat(len - 4))
  } else {
    "*".repeat(len)
  }
}
