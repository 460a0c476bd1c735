//! MCP server lifecycle and tool dispatch.
//!
//! 1. `initialize` negotiates the protocol revision (AwaitingInit → Initialising).
//! 2. `notifications/initialized` completes the handshake (→ Running).
//! 3. `tools/list` and `tools/call` are served only while Running.
//!
//! EOF on the input, SIGINT or SIGTERM end the session.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncWrite};

use super::protocol::{
  IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, OutgoingMessage, RequestId,
  SERVER_NAME, negotiate_version, parse_message,
};
use super::tools::{
  self, CONNECTION_STATUS, DOWNLOAD_ATTACHMENT, DOWNLOAD_ATTACHMENTS, DownloadAttachmentArgs, DownloadAttachmentsArgs,
  ToolCallParams, ToolCallResult, ToolDefinition,
};
use super::transport::{Frame, LineTransport, StdioTransport};
use crate::atlassian::{ConfluenceApi, FetchSession, JiraApi};
use crate::attachments::AttachmentFetcher;
use crate::status;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
  AwaitingInit,
  Initialising,
  Running,
  ShuttingDown,
}

/// Confluence collaborators: the listing API and the download session.
#[derive(Clone)]
pub struct ConfluenceHandle {
  pub api: Arc<dyn ConfluenceApi>,
  pub session: Arc<dyn FetchSession>,
}

/// Services available to tool handlers. `None` means not configured.
#[derive(Clone, Default)]
pub struct Services {
  pub confluence: Option<ConfluenceHandle>,
  pub jira: Option<Arc<dyn JiraApi>>,
}

/// Tool-level settings.
#[derive(Debug, Clone)]
pub struct ServerOptions {
  /// Concurrent downloads per batch.
  pub parallel: usize,
  /// Tool allow list; `None` enables every available tool.
  pub enabled_tools: Option<Vec<String>>,
}

impl Default for ServerOptions {
  fn default() -> Self {
    Self {
      parallel: 1,
      enabled_tools: None,
    }
  }
}

/// The Atlassian MCP server.
pub struct McpServer {
  state: ServerState,
  protocol_version: Option<&'static str>,
  services: Services,
  options: ServerOptions,
}

impl McpServer {
  pub fn new(services: Services, options: ServerOptions) -> Self {
    Self {
      state: ServerState::AwaitingInit,
      protocol_version: None,
      services,
      options,
    }
  }

  pub fn state(&self) -> ServerState {
    self.state
  }

  /// Serve on stdin/stdout until EOF or a termination signal.
  ///
  /// # Errors
  /// Returns an error if stdio fails or signal handlers cannot be installed.
  pub async fn run(&mut self) -> io::Result<()> {
    let mut transport = StdioTransport::stdio();
    tracing::info!("MCP server listening on stdio");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let interrupted = tokio::select! {
      result = &mut shutdown => {
        result?;
        true
      }
      result = self.serve(&mut transport) => {
        result?;
        false
      }
    };

    if interrupted {
      tracing::info!("Received shutdown signal");
      self.state = ServerState::ShuttingDown;
    }
    Ok(())
  }

  /// Serve messages from `transport` until EOF.
  ///
  /// # Errors
  /// Returns an error if reading or writing fails.
  pub async fn serve<R, W>(&mut self, transport: &mut LineTransport<R, W>) -> io::Result<()>
  where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
  {
    while let Some(frame) = transport.read_line().await? {
      let reply = match frame {
        Frame::Text(line) if line.trim().is_empty() => continue,
        Frame::Text(line) => self.handle_line(&line).await,
        Frame::InvalidUtf8 => {
          tracing::warn!("Rejected line that is not valid UTF-8");
          Some(OutgoingMessage::Error(JsonRpcError::parse_error()))
        }
      };
      if let Some(reply) = reply {
        transport.write_message(&reply).await?;
      }
    }

    tracing::info!("Input closed, shutting down");
    self.state = ServerState::ShuttingDown;
    Ok(())
  }

  /// Handle one line of input and return the reply, if any.
  pub async fn handle_line(&mut self, line: &str) -> Option<OutgoingMessage> {
    let message = parse_message(line);
    if let Ok(msg) = &message {
      tracing::trace!(method = msg.method(), "Received message");
    }

    match message {
      Ok(IncomingMessage::Request(req)) => Some(self.handle_request(req).await.into()),
      Ok(IncomingMessage::Notification(notif)) => {
        self.handle_notification(&notif);
        None
      }
      Err(error) => {
        tracing::warn!(code = error.error.code, "Rejected malformed message");
        Some(OutgoingMessage::Error(error))
      }
    }
  }

  async fn handle_request(&mut self, req: JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
    tracing::debug!(id = %req.id, method = %req.method, "Handling request");

    match req.method.as_str() {
      "initialize" => self.handle_initialize(&req),
      "ping" => Ok(JsonRpcResponse::success(req.id, json!({}))),
      "tools/list" => self.handle_tools_list(&req),
      "tools/call" => self.handle_tools_call(&req).await,
      _ => Err(JsonRpcError::method_not_found(req.id, &req.method)),
    }
  }

  fn handle_notification(&mut self, notif: &JsonRpcNotification) {
    match notif.method.as_str() {
      "notifications/initialized" if self.state == ServerState::Initialising => {
        tracing::info!(protocol = self.protocol_version.unwrap_or_default(), "Client initialised");
        self.state = ServerState::Running;
      }
      method => tracing::debug!(method, "Ignoring notification"),
    }
  }

  fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
    if self.state != ServerState::AwaitingInit {
      return Err(JsonRpcError::invalid_request(
        Some(req.id.clone()),
        "Server already initialised",
      ));
    }

    let requested = req
      .params
      .as_ref()
      .and_then(|params| params.get("protocolVersion"))
      .and_then(Value::as_str)
      .ok_or_else(|| JsonRpcError::invalid_params(req.id.clone(), "Missing protocolVersion"))?;

    let version = negotiate_version(requested);
    tracing::info!(requested, negotiated = version, "Negotiated protocol version");

    self.protocol_version = Some(version);
    self.state = ServerState::Initialising;

    Ok(JsonRpcResponse::success(
      req.id.clone(),
      json!({
        "protocolVersion": version,
        "capabilities": {"tools": {}},
        "serverInfo": {
          "name": SERVER_NAME,
          "version": env!("CARGO_PKG_VERSION"),
        },
      }),
    ))
  }

  fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
    if self.state != ServerState::Running {
      return Err(JsonRpcError::invalid_request(Some(id.clone()), "Server not initialised"));
    }
    Ok(())
  }

  /// Tools currently advertised.
  pub fn tools(&self) -> Vec<ToolDefinition> {
    tools::available_tools(
      self.services.confluence.is_some(),
      self.options.enabled_tools.as_deref(),
    )
  }

  fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
    self.require_running(&req.id)?;
    Ok(JsonRpcResponse::success(req.id.clone(), json!({ "tools": self.tools() })))
  }

  async fn handle_tools_call(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
    self.require_running(&req.id)?;

    let params: ToolCallParams = req
      .params
      .clone()
      .map(serde_json::from_value)
      .transpose()
      .map_err(|e| JsonRpcError::invalid_params(req.id.clone(), format!("Invalid tool call params: {e}")))?
      .ok_or_else(|| JsonRpcError::invalid_params(req.id.clone(), "Missing tool call params"))?;

    let result = self.call_tool(&params).await;

    let value = serde_json::to_value(&result).map_err(|e| {
      tracing::error!(error = %e, "Failed to serialize tool result");
      JsonRpcError::internal_error(req.id.clone(), "Failed to serialize tool result")
    })?;

    Ok(JsonRpcResponse::success(req.id.clone(), value))
  }

  /// Dispatch a tool call. Unknown or disabled tools yield an error result.
  pub async fn call_tool(&self, params: &ToolCallParams) -> ToolCallResult {
    if !self.tools().iter().any(|tool| tool.name == params.name) {
      return ToolCallResult::error(format!("Unknown tool: {}", params.name));
    }

    tracing::info!(tool = %params.name, "Calling tool");
    match params.name.as_str() {
      DOWNLOAD_ATTACHMENTS => self.call_download_attachments(&params.arguments).await,
      DOWNLOAD_ATTACHMENT => self.call_download_attachment(&params.arguments).await,
      CONNECTION_STATUS => self.call_connection_status().await,
      other => ToolCallResult::error(format!("Unknown tool: {other}")),
    }
  }

  fn confluence(&self) -> Result<&ConfluenceHandle, ToolCallResult> {
    self
      .services
      .confluence
      .as_ref()
      .ok_or_else(|| ToolCallResult::error("Confluence is not configured"))
  }

  async fn call_download_attachments(&self, arguments: &Value) -> ToolCallResult {
    let args: DownloadAttachmentsArgs = match serde_json::from_value(arguments.clone()) {
      Ok(args) => args,
      Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
    };
    let handle = match self.confluence() {
      Ok(handle) => handle,
      Err(result) => return result,
    };

    let fetcher =
      AttachmentFetcher::new(handle.api.as_ref(), handle.session.as_ref()).with_concurrency(self.options.parallel);

    match fetcher
      .download_page_attachments(&args.page_id, &PathBuf::from(&args.target_dir))
      .await
    {
      Ok(result) => ToolCallResult::json(&result),
      Err(err) => ToolCallResult::error(format!(
        "Failed to download attachments for page {}: {err}",
        args.page_id
      )),
    }
  }

  async fn call_download_attachment(&self, arguments: &Value) -> ToolCallResult {
    let args: DownloadAttachmentArgs = match serde_json::from_value(arguments.clone()) {
      Ok(args) => args,
      Err(e) => return ToolCallResult::error(format!("Invalid arguments: {e}")),
    };
    let handle = match self.confluence() {
      Ok(handle) => handle,
      Err(result) => return result,
    };

    let target = PathBuf::from(&args.target_path);
    let path = std::path::absolute(&target).unwrap_or(target);

    let fetcher = AttachmentFetcher::new(handle.api.as_ref(), handle.session.as_ref());
    let success = fetcher.download_attachment(&args.url, &path).await;

    let mut result = ToolCallResult::json(&json!({
      "success": success,
      "url": args.url,
      "path": path.display().to_string(),
    }));
    result.is_error = result.is_error || !success;
    result
  }

  async fn call_connection_status(&self) -> ToolCallResult {
    let confluence = self.services.confluence.as_ref().map(|handle| handle.api.as_ref());
    let jira = self.services.jira.as_deref();

    let report = status::get_connection_status(confluence, jira).await;
    ToolCallResult::json(&report)
  }
}

/// Resolves when the process is asked to stop.
#[cfg(unix)]
async fn shutdown_signal() -> io::Result<()> {
  use tokio::signal::unix::{SignalKind, signal};

  let mut sigint = signal(SignalKind::interrupt())?;
  let mut sigterm = signal(SignalKind::terminate())?;

  tokio::select! {
    _ = sigint.recv() => {}
    _ = sigterm.recv() => {}
  }
  Ok(())
}

/// Resolves when the process is asked to stop.
#[cfg(not(unix))]
async fn shutdown_signal() -> io::Result<()> {
  tokio::signal::ctrl_c().await
}
