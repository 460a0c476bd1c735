//! Terminal colors for human-readable command output.
//!
//! Styles are semantic (success, error, link, ...) so every command renders
//! the same kind of information the same way. Machine-readable output
//! (`--json`, MCP frames) is never colored.

use std::fmt::Display;

use owo_colors::{OwoColorize, Style};

use crate::cli::ColorOption;
use crate::status::OverallStatus;

/// Semantic color palette, disabled entirely when colors are off.
pub struct ColorScheme {
  enabled: bool,
}

impl ColorScheme {
  /// Honor `--color`; `auto` enables colors only when stdout is a terminal.
  pub fn new(color_option: ColorOption) -> Self {
    let enabled = match color_option {
      ColorOption::Always => true,
      ColorOption::Never => false,
      ColorOption::Auto => {
        use std::io::IsTerminal;
        std::io::stdout().is_terminal()
      }
    };

    Self { enabled }
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  fn paint<T: Display>(&self, text: T, style: Style) -> String {
    if self.enabled {
      text.style(style).to_string()
    } else {
      text.to_string()
    }
  }

  pub fn success<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().green())
  }

  pub fn error<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().bright_red().bold())
  }

  pub fn warning<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().yellow())
  }

  pub fn info<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().cyan())
  }

  pub fn emphasis<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().bright_white().bold())
  }

  pub fn link<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().blue().underline())
  }

  pub fn path<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().magenta())
  }

  pub fn number<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().bright_blue())
  }

  pub fn code<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().bright_green())
  }

  pub fn dimmed<T: Display>(&self, text: T) -> String {
    self.paint(text, Style::new().dimmed())
  }

  /// `✓` or `✗`, colored to match.
  pub fn mark(&self, ok: bool) -> String {
    if ok { self.success("✓") } else { self.error("✗") }
  }

  /// Overall connection status colored by severity.
  pub fn overall(&self, status: OverallStatus) -> String {
    match status {
      OverallStatus::Healthy => self.success(status.as_str()),
      OverallStatus::Degraded => self.warning(status.as_str()),
      OverallStatus::Unavailable => self.error(status.as_str()),
    }
  }
}
