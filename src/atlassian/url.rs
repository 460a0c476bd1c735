//! Helpers for turning user input into page identifiers and instance URLs.

use anyhow::{Context, Result, anyhow};
use url::Url;

/// A page reference extracted from a page URL or a bare page ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReference {
  /// Instance root derived from the URL, including the `/wiki` context path
  /// when present. `None` for bare IDs.
  pub base_url: Option<String>,
  /// Numeric identifier of the page.
  pub page_id: String,
}

/// Parse a page URL or numeric page ID.
///
/// Supports:
/// - `123456`
/// - `https://example.atlassian.net/wiki/spaces/SPACE/pages/123456/Page+Title`
/// - `https://example.atlassian.net/wiki/pages/123456`
/// - `https://confluence.example.com/pages/viewpage.action?pageId=123456`
///
/// # Errors
/// Returns an error when the URL is malformed, has no host, carries no page
/// identifier, or the identifier is not numeric.
pub fn parse_page_reference(input: &str) -> Result<PageReference> {
  let input = input.trim();

  if !input.contains("://") {
    ensure_numeric(input)?;
    return Ok(PageReference {
      base_url: None,
      page_id: input.to_string(),
    });
  }

  let parsed = Url::parse(input).context("Invalid URL format")?;
  let host = parsed.host_str().context("URL missing host")?;

  let mut base_url = match parsed.port() {
    Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
    None => format!("{}://{}", parsed.scheme(), host),
  };

  let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
  if segments.first() == Some(&"wiki") {
    base_url.push_str("/wiki");
  }

  if let Some((_, page_id)) = parsed.query_pairs().find(|(key, _)| key == "pageId") {
    ensure_numeric(&page_id)?;
    return Ok(PageReference {
      base_url: Some(base_url),
      page_id: page_id.into_owned(),
    });
  }

  let pages_pos = segments
    .iter()
    .position(|&s| s == "pages")
    .context("URL does not contain 'pages' segment")?;

  let page_id = segments
    .get(pages_pos + 1)
    .ok_or_else(|| anyhow!("URL does not contain page ID after 'pages' segment"))?;
  ensure_numeric(page_id)?;

  Ok(PageReference {
    base_url: Some(base_url),
    page_id: (*page_id).to_string(),
  })
}

/// Confluence page IDs are non-empty runs of ASCII digits.
pub fn is_page_id(page_id: &str) -> bool {
  !page_id.is_empty() && page_id.chars().all(|c| c.is_ascii_digit())
}

fn ensure_numeric(page_id: &str) -> Result<()> {
  if !is_page_id(page_id) {
    return Err(anyhow!("Page ID is not numeric: {page_id}"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_cloud_url_with_space() {
    let url = "https://example.atlassian.net/wiki/spaces/~example-user/pages/229483/Getting+started";
    let reference = parse_page_reference(url).unwrap();

    assert_eq!(reference.base_url.as_deref(), Some("https://example.atlassian.net/wiki"));
    assert_eq!(reference.page_id, "229483");
  }

  #[test]
  fn parses_server_url_without_context_path() {
    let reference = parse_page_reference("http://localhost:8090/pages/123456").unwrap();

    assert_eq!(reference.base_url.as_deref(), Some("http://localhost:8090"));
    assert_eq!(reference.page_id, "123456");
  }

  #[test]
  fn parses_viewpage_query_parameter() {
    let reference = parse_page_reference("https://confluence.example.com/pages/viewpage.action?pageId=98765").unwrap();

    assert_eq!(reference.base_url.as_deref(), Some("https://confluence.example.com"));
    assert_eq!(reference.page_id, "98765");
  }

  #[test]
  fn parses_bare_page_id() {
    let reference = parse_page_reference(" 123456 ").unwrap();
    assert_eq!(reference.base_url, None);
    assert_eq!(reference.page_id, "123456");
  }

  #[test]
  fn rejects_non_numeric_id() {
    assert!(parse_page_reference("https://example.atlassian.net/wiki/pages/notanumber").is_err());
    assert!(parse_page_reference("page-one").is_err());
  }

  #[test]
  fn rejects_url_without_pages_segment() {
    assert!(parse_page_reference("https://example.com/not-a-confluence-url").is_err());
  }

  #[test]
  fn rejects_pages_at_end() {
    let result = parse_page_reference("https://example.atlassian.net/wiki/pages");
    assert!(result.unwrap_err().to_string().contains("does not contain page ID"));
  }

  #[test]
  fn rejects_url_without_host() {
    assert!(parse_page_reference("file:///wiki/pages/123").is_err());
  }

  #[test]
  fn page_ids_are_digits_only() {
    assert!(is_page_id("123456"));
    assert!(!is_page_id(""));
    assert!(!is_page_id("12/../34"));
    assert!(!is_page_id("١٢٣"));
  }
}
