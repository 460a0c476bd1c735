//! `atlassian-mcp download`: fetch every attachment of a page from the
//! terminal.

use std::path::Path;

use anyhow::{Context, Result, bail};

use super::load_config;
use crate::atlassian::parse_page_reference;
use crate::attachments::{AttachmentFetcher, DownloadResult};
use crate::cli::Cli;
use crate::color::ColorScheme;
use crate::config::{Service, ServiceConfig};
use crate::credentials::NetrcProvider;

/// Download the attachments of `target` (page URL or ID) into `output`.
///
/// When no Confluence URL is configured, the instance URL embedded in a page
/// URL is used instead.
///
/// # Errors
/// Fails when the page reference or configuration is invalid, the listing
/// request fails, or any individual file could not be saved.
pub(crate) async fn handle_download_command(
  target: &str,
  output: &Path,
  json: bool,
  cli: &Cli,
  colors: &ColorScheme,
) -> Result<()> {
  let page = parse_page_reference(target)?;
  let mut config = load_config(cli)?;

  let service = match (config.confluence.take(), page.base_url.as_deref()) {
    (Some(service), _) => service,
    (None, Some(base_url)) => {
      tracing::debug!(base_url, "Using the instance URL from the page link");
      let mut settings = cli.confluence.settings();
      settings.url = Some(base_url.to_string());
      ServiceConfig::resolve(Service::Confluence, &settings, &NetrcProvider::new())?
        .context("Confluence URL could not be resolved")?
    }
    (None, None) => {
      bail!("Confluence URL not provided. Use --confluence-url, CONFLUENCE_URL, or pass a full page URL")
    }
  };

  let client = service.confluence_client(&config.client)?;

  if !json {
    println!(
      "{} Downloading attachments of page {} into {}",
      colors.info("→"),
      colors.number(&page.page_id),
      colors.path(output.display())
    );
  }

  let result = AttachmentFetcher::new(&client, &client)
    .with_concurrency(config.parallel)
    .download_page_attachments(&page.page_id, output)
    .await
    .with_context(|| format!("Failed to download attachments of page {}", page.page_id))?;

  if json {
    println!("{}", serde_json::to_string_pretty(&result)?);
  } else {
    print_result(&result, colors);
  }

  if !result.failed.is_empty() {
    bail!("{} of {} attachments failed to download", result.failed.len(), result.total);
  }
  Ok(())
}

fn print_result(result: &DownloadResult, colors: &ColorScheme) {
  if let Some(message) = &result.message {
    println!("{} {}", colors.info("ℹ"), message);
    return;
  }

  for file in &result.downloaded {
    let size = file
      .size
      .map(|bytes| format!(" ({} bytes)", colors.number(bytes)))
      .unwrap_or_default();
    println!("  {} {}{}", colors.success("✓"), colors.path(file.path.display()), size);
  }

  for file in &result.failed {
    println!(
      "  {} {}: {}",
      colors.error("✗"),
      file.filename.as_deref().unwrap_or("(untitled)"),
      colors.error(&file.error)
    );
  }

  println!(
    "\n{} {} of {} attachments downloaded",
    colors.mark(result.failed.is_empty()),
    colors.number(result.downloaded.len()),
    colors.number(result.total)
  );
}
