//! Command-line interface definitions for atlassian-mcp.
//!
//! Every connection setting can come from a flag or from the environment
//! variable of the same meaning; flags win. Running without a subcommand
//! starts the MCP server on stdio.

use std::path::PathBuf;
use std::process;

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::atlassian::ClientOptions;
use crate::color::ColorScheme;
use crate::commands::auth::handle_auth_command;
use crate::commands::completions::handle_completions_command;
use crate::commands::download::handle_download_command;
use crate::commands::serve::handle_serve_command;
use crate::commands::status::handle_status_command;
use crate::commands::version::handle_version_command;
use crate::config::{self, AppConfig, Service, ServiceConfig, ServiceSettings};
use crate::credentials::CredentialsProvider;
use crate::error::{ApiError, BatchError, ConfigError};

/// atlassian-mcp - Confluence attachments and Atlassian status over MCP
#[derive(Debug, Parser)]
#[command(
  name = "atlassian-mcp",
  version,
  about = "MCP server for Confluence attachment downloads and Atlassian connection checks",
  long_about = "Serves Model Context Protocol tools over stdio for downloading Confluence page\n\
                attachments and checking Jira/Confluence connectivity. The same operations are\n\
                available as terminal subcommands.",
  styles = get_clap_styles()
)]
pub struct Cli {
  /// Subcommand to execute (defaults to `serve`)
  #[command(subcommand)]
  pub command: Option<Command>,

  /// Confluence connection options
  #[command(flatten)]
  pub confluence: ConfluenceOptions,

  /// Jira connection options
  #[command(flatten)]
  pub jira: JiraOptions,

  /// Tool selection
  #[command(flatten)]
  pub tools: ToolOptions,

  /// Behavior options
  #[command(flatten)]
  pub behavior: BehaviorOptions,

  /// Performance options
  #[command(flatten)]
  pub performance: PerformanceOptions,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
  /// Run the MCP server on stdio (default)
  Serve,

  /// Download every attachment of a Confluence page
  Download {
    /// Page URL or numeric page ID
    #[arg(value_name = "PAGE_URL_OR_ID")]
    target: String,

    /// Directory to save attachments into
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    output: PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
  },

  /// Check connectivity and authentication for the configured services
  Status {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
  },

  /// Inspect the resolved credentials
  Auth {
    #[command(subcommand)]
    subcommand: AuthCommand,
  },

  /// Display version and build information
  Version {
    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Show only version number
    #[arg(long, conflicts_with = "json")]
    short: bool,
  },

  /// Generate shell completion scripts
  Completions {
    /// Target shell for completions
    #[arg(value_enum)]
    shell: Shell,
  },
}

/// Authentication subcommands
#[derive(Debug, Subcommand)]
pub enum AuthCommand {
  /// Show configured services, credential sources and masked tokens
  Show,
}

/// Shells supported by `completions`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
  Bash,
  Zsh,
  Fish,
  Powershell,
  Elvish,
}

fn parse_url(url: &str) -> Result<String, String> {
  config::normalize_url(url)
}

/// Confluence connection options
#[derive(Debug, Parser)]
pub struct ConfluenceOptions {
  /// Confluence base URL (include `/wiki` for Cloud)
  #[arg(long, env = "CONFLUENCE_URL", value_name = "URL", value_parser = parse_url)]
  pub confluence_url: Option<String>,

  /// Confluence username (email address on Cloud)
  #[arg(long, env = "CONFLUENCE_USERNAME", value_name = "EMAIL")]
  pub confluence_username: Option<String>,

  /// Confluence API token
  #[arg(long, env = "CONFLUENCE_API_TOKEN", value_name = "TOKEN", hide_env_values = true)]
  pub confluence_token: Option<String>,

  /// Confluence personal access token (Server/Data Center)
  #[arg(long, env = "CONFLUENCE_PERSONAL_TOKEN", value_name = "TOKEN", hide_env_values = true)]
  pub confluence_personal_token: Option<String>,

  /// Verify Confluence TLS certificates
  #[arg(
    long,
    env = "CONFLUENCE_SSL_VERIFY",
    value_name = "BOOL",
    default_value = "true",
    action = clap::ArgAction::Set,
    value_parser = BoolishValueParser::new()
  )]
  pub confluence_ssl_verify: bool,
}

impl ConfluenceOptions {
  pub fn settings(&self) -> ServiceSettings {
    ServiceSettings {
      url: self.confluence_url.clone(),
      username: self.confluence_username.clone(),
      api_token: self.confluence_token.clone(),
      personal_token: self.confluence_personal_token.clone(),
      ssl_verify: self.confluence_ssl_verify,
    }
  }
}

/// Jira connection options
#[derive(Debug, Parser)]
pub struct JiraOptions {
  /// Jira base URL
  #[arg(long, env = "JIRA_URL", value_name = "URL", value_parser = parse_url)]
  pub jira_url: Option<String>,

  /// Jira username (email address on Cloud)
  #[arg(long, env = "JIRA_USERNAME", value_name = "EMAIL")]
  pub jira_username: Option<String>,

  /// Jira API token
  #[arg(long, env = "JIRA_API_TOKEN", value_name = "TOKEN", hide_env_values = true)]
  pub jira_token: Option<String>,

  /// Jira personal access token (Server/Data Center)
  #[arg(long, env = "JIRA_PERSONAL_TOKEN", value_name = "TOKEN", hide_env_values = true)]
  pub jira_personal_token: Option<String>,

  /// Verify Jira TLS certificates
  #[arg(
    long,
    env = "JIRA_SSL_VERIFY",
    value_name = "BOOL",
    default_value = "true",
    action = clap::ArgAction::Set,
    value_parser = BoolishValueParser::new()
  )]
  pub jira_ssl_verify: bool,
}

impl JiraOptions {
  pub fn settings(&self) -> ServiceSettings {
    ServiceSettings {
      url: self.jira_url.clone(),
      username: self.jira_username.clone(),
      api_token: self.jira_token.clone(),
      personal_token: self.jira_personal_token.clone(),
      ssl_verify: self.jira_ssl_verify,
    }
  }
}

/// Tool selection options
#[derive(Debug, Parser)]
pub struct ToolOptions {
  /// Comma-separated list of tools to expose (default: all available)
  #[arg(long, env = "ENABLED_TOOLS", value_name = "TOOLS")]
  pub enabled_tools: Option<String>,
}

/// Behavior options
#[derive(Debug, Parser)]
pub struct BehaviorOptions {
  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Colorize output
  #[arg(long, value_enum, default_value = "auto", value_name = "WHEN")]
  pub color: ColorOption,
}

/// Color output options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorOption {
  Auto,
  Always,
  Never,
}

/// Performance options
#[derive(Debug, Parser)]
pub struct PerformanceOptions {
  /// Number of attachments downloaded concurrently
  #[arg(long, default_value = "4", value_name = "N")]
  pub parallel: usize,

  /// Max requests per second, per service
  #[arg(long, default_value = "10", value_name = "N")]
  pub rate_limit: usize,

  /// Request timeout in seconds
  #[arg(long, default_value = "30", value_name = "SECONDS")]
  pub timeout: u64,
}

impl Cli {
  /// Parse CLI arguments from the environment
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Validate CLI arguments
  ///
  /// Returns an error if the CLI configuration is invalid.
  pub fn validate(&self) -> Result<(), String> {
    if self.performance.parallel == 0 {
      return Err("--parallel must be at least 1".to_string());
    }

    if self.performance.rate_limit == 0 {
      return Err("--rate-limit must be at least 1 request per second".to_string());
    }

    Ok(())
  }

  /// Transport options shared by every client.
  pub fn client_options(&self) -> ClientOptions {
    ClientOptions {
      timeout_secs: self.performance.timeout,
      rate_limit: self.performance.rate_limit,
      ssl_verify: true,
    }
  }

  /// Resolve both services and the runtime settings.
  ///
  /// # Errors
  /// Returns the first [`ConfigError`] hit while resolving a service.
  pub fn app_config(&self, provider: &dyn CredentialsProvider) -> Result<AppConfig, ConfigError> {
    Ok(AppConfig {
      confluence: ServiceConfig::resolve(Service::Confluence, &self.confluence.settings(), provider)?,
      jira: ServiceConfig::resolve(Service::Jira, &self.jira.settings(), provider)?,
      client: self.client_options(),
      parallel: self.performance.parallel,
      enabled_tools: config::parse_enabled_tools(self.tools.enabled_tools.as_deref()),
    })
  }
}

/// Parse CLI arguments, initialize shared services, and dispatch to the chosen
/// command.
pub async fn run() {
  let cli = Cli::parse_args();

  init_tracing(&cli.behavior);

  let colors = ColorScheme::new(cli.behavior.color);

  if let Err(e) = cli.validate() {
    eprintln!("{} {}", colors.error("Error:"), e);
    process::exit(4);
  }

  let result = match &cli.command {
    None | Some(Command::Serve) => handle_serve_command(&cli).await,
    Some(Command::Download { target, output, json }) => {
      handle_download_command(target, output, *json, &cli, &colors).await
    }
    Some(Command::Status { json }) => handle_status_command(*json, &cli, &colors).await,
    Some(Command::Auth { subcommand }) => handle_auth_command(subcommand, &cli, &colors),
    Some(Command::Version { json, short }) => {
      handle_version_command(*json, *short, &colors);
      Ok(())
    }
    Some(Command::Completions { shell }) => {
      handle_completions_command(*shell);
      Ok(())
    }
  };

  if let Err(err) = result {
    eprintln!("{} {err:#}", colors.error("Error:"));
    process::exit(exit_code(&err));
  }
}

/// Map a command failure to the process exit code: 2 for authentication and
/// credential problems, 4 for invalid configuration, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> i32 {
  for cause in err.chain() {
    if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
      return match config_err {
        ConfigError::MissingCredentials { .. } | ConfigError::Netrc(_) => 2,
        ConfigError::InvalidUrl { .. } | ConfigError::Invalid(_) => 4,
      };
    }
    let api_err = cause
      .downcast_ref::<ApiError>()
      .or_else(|| match cause.downcast_ref::<BatchError>() {
        Some(BatchError::Listing(api_err)) => Some(api_err),
        _ => None,
      });
    if api_err.is_some_and(ApiError::is_auth_failure) {
      return 2;
    }
  }
  1
}

fn init_tracing(behavior: &BehaviorOptions) {
  let level = if behavior.quiet {
    LevelFilter::ERROR
  } else {
    match behavior.verbose {
      0 => LevelFilter::WARN,
      1 => LevelFilter::INFO,
      2 => LevelFilter::DEBUG,
      _ => LevelFilter::TRACE,
    }
  };

  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_ansi(false)
    .with_writer(std::io::stderr)
    .try_init();
}

/// Get custom styles for clap help output
fn get_clap_styles() -> clap::builder::Styles {
  use clap::builder::styling::{AnsiColor, Effects};

  clap::builder::Styles::styled()
    .header(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
    .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
    .literal(AnsiColor::BrightGreen.on_default())
    .placeholder(AnsiColor::BrightCyan.on_default())
    .error(AnsiColor::BrightRed.on_default() | Effects::BOLD)
    .valid(AnsiColor::BrightGreen.on_default())
    .invalid(AnsiColor::BrightRed.on_default())
}
