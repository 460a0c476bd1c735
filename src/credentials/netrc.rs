//! `.netrc` credential discovery.
//!
//! The parser is token based, so both the multi-line layout and the classic
//! single-line `machine h login u password p` form are understood. `macdef`
//! bodies are skipped up to the next blank line.

use std::path::PathBuf;

use super::{Credential, CredentialError, CredentialsProvider};

/// Reads credentials from a `.netrc` file (by default `~/.netrc`).
#[derive(Debug, Default, Clone)]
pub struct NetrcProvider {
  path: Option<PathBuf>,
}

impl NetrcProvider {
  /// Provider for `$HOME/.netrc`.
  pub fn new() -> Self {
    Self { path: None }
  }

  /// Provider for an explicit file, used by tests and `--netrc`-style setups.
  pub fn with_path(path: impl Into<PathBuf>) -> Self {
    Self {
      path: Some(path.into()),
    }
  }

  fn resolve_path(&self) -> Result<PathBuf, CredentialError> {
    if let Some(path) = &self.path {
      return Ok(path.clone());
    }
    let home = std::env::var_os("HOME").ok_or(CredentialError::NoHome)?;
    Ok(PathBuf::from(home).join(".netrc"))
  }
}

impl CredentialsProvider for NetrcProvider {
  /// A missing file is not an error; it simply has no entries.
  fn get_credentials(&self, host: &str) -> Result<Option<Credential>, CredentialError> {
    let path = self.resolve_path()?;
    if !path.exists() {
      return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|source| CredentialError::Io { path, source })?;
    Ok(lookup(&content, host))
  }

  fn name(&self) -> &'static str {
    "netrc"
  }
}

#[derive(Debug, PartialEq, Eq)]
enum Machine {
  Host(String),
  Default,
}

#[derive(Debug)]
struct Entry {
  machine: Machine,
  login: Option<String>,
  password: Option<String>,
}

impl Entry {
  fn new(machine: Machine) -> Self {
    Self {
      machine,
      login: None,
      password: None,
    }
  }

  fn credential(&self) -> Option<Credential> {
    Some(Credential {
      username: self.login.clone()?,
      password: self.password.clone()?,
    })
  }
}

/// Find credentials for `host`: the first complete `machine` entry wins,
/// otherwise the first complete `default` entry. Host names compare
/// case-insensitively.
fn lookup(content: &str, host: &str) -> Option<Credential> {
  let entries = parse_entries(content);

  entries
    .iter()
    .filter(|entry| matches!(&entry.machine, Machine::Host(name) if name.eq_ignore_ascii_case(host)))
    .find_map(Entry::credential)
    .or_else(|| {
      entries
        .iter()
        .filter(|entry| entry.machine == Machine::Default)
        .find_map(Entry::credential)
    })
}

fn parse_entries(content: &str) -> Vec<Entry> {
  let mut entries = Vec::new();
  let mut current: Option<Entry> = None;
  let mut in_macro = false;

  for line in content.lines() {
    let trimmed = line.trim();

    if in_macro {
      in_macro = !trimmed.is_empty();
      continue;
    }
    if trimmed.starts_with('#') {
      continue;
    }

    let mut tokens = trimmed.split_whitespace();
    while let Some(token) = tokens.next() {
      match token {
        "machine" => {
          entries.extend(current.take());
          current = tokens.next().map(|name| Entry::new(Machine::Host(name.to_string())));
        }
        "default" => {
          entries.extend(current.take());
          current = Some(Entry::new(Machine::Default));
        }
        "login" => {
          let value = tokens.next().map(str::to_string);
          if let Some(entry) = current.as_mut() {
            entry.login = value;
          }
        }
        "password" => {
          let value = tokens.next().map(str::to_string);
          if let Some(entry) = current.as_mut() {
            entry.password = value;
          }
        }
        "account" | "port" => {
          tokens.next();
        }
        "macdef" => {
          in_macro = true;
          break;
        }
        _ => {}
      }
    }
  }

  entries.extend(current);
  entries
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  fn creds(content: &str, host: &str) -> Option<(String, String)> {
    lookup(content, host).map(|c| (c.username, c.password))
  }

  #[test]
  fn finds_multi_line_entry() {
    let content = r#"
machine example.atlassian.net
  login user@example.com
  password api-token-123
"#;
    assert_eq!(
      creds(content, "example.atlassian.net"),
      Some(("user@example.com".into(), "api-token-123".into()))
    );
  }

  #[test]
  fn finds_single_line_entries() {
    let content = "machine a.com login u1 password p1 machine b.com login u2 password p2";
    assert_eq!(creds(content, "a.com"), Some(("u1".into(), "p1".into())));
    assert_eq!(creds(content, "b.com"), Some(("u2".into(), "p2".into())));
  }

  #[test]
  fn returns_none_for_unknown_host() {
    let content = "machine example.com login u password p";
    assert_eq!(creds(content, "other.com"), None);
  }

  #[test]
  fn host_match_ignores_case() {
    let content = "machine Example.COM login u password p";
    assert!(creds(content, "example.com").is_some());
  }

  #[test]
  fn specific_machine_beats_default_regardless_of_order() {
    let content = r#"
default
  login fallback
  password fallback-pass

machine example.com
  login specific
  password specific-pass
"#;
    assert_eq!(creds(content, "example.com"), Some(("specific".into(), "specific-pass".into())));
    assert_eq!(creds(content, "elsewhere.com"), Some(("fallback".into(), "fallback-pass".into())));

    let reversed = "machine example.com login specific password sp\ndefault login fallback password fp";
    assert_eq!(creds(reversed, "example.com"), Some(("specific".into(), "sp".into())));
  }

  #[test]
  fn incomplete_entries_are_skipped() {
    let content = r#"
machine example.com
  login only-login

machine example.com
  login complete
  password complete-pass
"#;
    assert_eq!(creds(content, "example.com"), Some(("complete".into(), "complete-pass".into())));
    assert_eq!(creds("machine x.com password p", "x.com"), None);
  }

  #[test]
  fn comments_and_macros_are_ignored() {
    let content = r#"
# work instance
machine example.com
  login user1
  password pass1

macdef init
machine evil.com login bad password bad

machine other.com login user2 password pass2
"#;
    assert_eq!(creds(content, "example.com"), Some(("user1".into(), "pass1".into())));
    assert_eq!(creds(content, "evil.com"), None);
    assert_eq!(creds(content, "other.com"), Some(("user2".into(), "pass2".into())));
  }

  #[test]
  fn account_and_port_values_are_not_mistaken_for_keywords() {
    let content = "machine example.com account login login user password pass";
    assert_eq!(creds(content, "example.com"), Some(("user".into(), "pass".into())));
  }

  #[test]
  fn machine_without_hostname_is_ignored() {
    assert_eq!(creds("machine", "example.com"), None);
  }

  #[test]
  fn provider_reads_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "machine example.com login user password pass").unwrap();

    let provider = NetrcProvider::with_path(file.path());
    let credential = provider.get_credentials("example.com").unwrap().unwrap();
    assert_eq!(credential.username, "user");
    assert_eq!(provider.name(), "netrc");
  }

  #[test]
  fn provider_treats_missing_file_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let provider = NetrcProvider::with_path(dir.path().join("absent"));
    assert!(provider.get_credentials("example.com").unwrap().is_none());
  }
}
