//! JSON-RPC 2.0 message types used by the MCP server.
//!
//! Requests carry an `id` and get exactly one reply; notifications carry none
//! and get no reply. MCP forbids `null` ids.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revisions this server understands, oldest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Revision answered when the client asks for one we do not know.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "atlassian-mcp";

/// Pick the protocol revision for a session: the client's request when
/// supported, otherwise the newest revision we speak.
pub fn negotiate_version(requested: &str) -> &'static str {
  SUPPORTED_PROTOCOL_VERSIONS
    .iter()
    .copied()
    .find(|version| *version == requested)
    .unwrap_or(LATEST_PROTOCOL_VERSION)
}

/// Request identifier: a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
  Number(i64),
  String(String),
}

impl std::fmt::Display for RequestId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Number(n) => write!(f, "{n}"),
      Self::String(s) => f.write_str(s),
    }
  }
}

/// An incoming request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
  pub jsonrpc: String,
  pub id: RequestId,
  pub method: String,
  #[serde(default)]
  pub params: Option<Value>,
}

/// An incoming notification.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcNotification {
  pub jsonrpc: String,
  pub method: String,
  #[serde(default)]
  pub params: Option<Value>,
}

/// Either kind of incoming message.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
  Request(JsonRpcRequest),
  Notification(JsonRpcNotification),
}

impl IncomingMessage {
  pub fn method(&self) -> &str {
    match self {
      Self::Request(req) => &req.method,
      Self::Notification(notif) => &notif.method,
    }
  }
}

/// A successful reply.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
  pub jsonrpc: &'static str,
  pub id: RequestId,
  pub result: Value,
}

impl JsonRpcResponse {
  pub fn success(id: RequestId, result: Value) -> Self {
    Self {
      jsonrpc: "2.0",
      id,
      result,
    }
  }
}

/// Standard JSON-RPC error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
  ParseError,
  InvalidRequest,
  MethodNotFound,
  InvalidParams,
  InternalError,
}

impl ErrorCode {
  pub const fn code(self) -> i32 {
    match self {
      Self::ParseError => -32700,
      Self::InvalidRequest => -32600,
      Self::MethodNotFound => -32601,
      Self::InvalidParams => -32602,
      Self::InternalError => -32603,
    }
  }

  pub const fn default_message(self) -> &'static str {
    match self {
      Self::ParseError => "Parse error",
      Self::InvalidRequest => "Invalid Request",
      Self::MethodNotFound => "Method not found",
      Self::InvalidParams => "Invalid params",
      Self::InternalError => "Internal error",
    }
  }
}

/// The `error` member of an error reply.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
  pub code: i32,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
}

impl JsonRpcErrorData {
  pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
    Self {
      code: code.code(),
      message: message.into(),
      data: None,
    }
  }
}

impl From<ErrorCode> for JsonRpcErrorData {
  fn from(code: ErrorCode) -> Self {
    Self::new(code, code.default_message())
  }
}

/// An error reply. `id` is omitted when the request could not be identified.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
  pub jsonrpc: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<RequestId>,
  pub error: JsonRpcErrorData,
}

impl JsonRpcError {
  pub fn new(id: Option<RequestId>, error: impl Into<JsonRpcErrorData>) -> Self {
    Self {
      jsonrpc: "2.0",
      id,
      error: error.into(),
    }
  }

  pub fn parse_error() -> Self {
    Self::new(None, ErrorCode::ParseError)
  }

  pub fn invalid_request(id: Option<RequestId>, message: impl Into<String>) -> Self {
    Self::new(id, JsonRpcErrorData::new(ErrorCode::InvalidRequest, message))
  }

  pub fn method_not_found(id: RequestId, method: &str) -> Self {
    Self::new(
      Some(id),
      JsonRpcErrorData::new(ErrorCode::MethodNotFound, format!("Method not found: {method}")),
    )
  }

  pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
    Self::new(Some(id), JsonRpcErrorData::new(ErrorCode::InvalidParams, message))
  }

  pub fn internal_error(id: RequestId, message: impl Into<String>) -> Self {
    Self::new(Some(id), JsonRpcErrorData::new(ErrorCode::InternalError, message))
  }
}

/// Anything the server writes back to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
  Response(JsonRpcResponse),
  Error(JsonRpcError),
}

impl From<Result<JsonRpcResponse, JsonRpcError>> for OutgoingMessage {
  fn from(result: Result<JsonRpcResponse, JsonRpcError>) -> Self {
    match result {
      Ok(response) => Self::Response(response),
      Err(error) => Self::Error(error),
    }
  }
}

/// Parse one line of input.
///
/// # Errors
/// Returns a ready-to-send [`JsonRpcError`]: `ParseError` for invalid JSON or
/// a non-object, `InvalidRequest` for a wrong `jsonrpc` version, an empty
/// method or a malformed id.
pub fn parse_message(line: &str) -> Result<IncomingMessage, JsonRpcError> {
  let value: Value = serde_json::from_str(line).map_err(|_| JsonRpcError::parse_error())?;
  let object = value.as_object().ok_or_else(JsonRpcError::parse_error)?;

  if object.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
    return Err(JsonRpcError::invalid_request(None, "jsonrpc field must be \"2.0\""));
  }

  if object.contains_key("id") {
    let request: JsonRpcRequest = serde_json::from_value(value)
      .map_err(|e| JsonRpcError::invalid_request(None, format!("Invalid request: {e}")))?;

    if request.method.is_empty() {
      return Err(JsonRpcError::invalid_request(Some(request.id), "method field cannot be empty"));
    }
    return Ok(IncomingMessage::Request(request));
  }

  let notification: JsonRpcNotification = serde_json::from_value(value)
    .map_err(|e| JsonRpcError::invalid_request(None, format!("Invalid notification: {e}")))?;
  Ok(IncomingMessage::Notification(notification))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn parses_request_with_numeric_id() {
    let msg = parse_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).unwrap();
    let IncomingMessage::Request(req) = msg else {
      panic!("expected request");
    };
    assert_eq!(req.id, RequestId::Number(1));
    assert_eq!(req.method, "initialize");
  }

  #[test]
  fn parses_notification_without_id() {
    let msg = parse_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
    assert!(matches!(msg, IncomingMessage::Notification(_)));
    assert_eq!(msg.method(), "notifications/initialized");
  }

  #[test]
  fn invalid_json_is_parse_error() {
    let err = parse_message("{not json").unwrap_err();
    assert_eq!(err.error.code, -32700);
    assert!(err.id.is_none());
  }

  #[test]
  fn wrong_version_and_null_id_are_invalid_requests() {
    let err = parse_message(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).unwrap_err();
    assert_eq!(err.error.code, -32600);

    let err = parse_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap_err();
    assert_eq!(err.error.code, -32600);
  }

  #[test]
  fn empty_method_keeps_request_id() {
    let err = parse_message(r#"{"jsonrpc":"2.0","id":"abc","method":""}"#).unwrap_err();
    assert_eq!(err.id, Some(RequestId::String("abc".to_string())));
  }

  #[test]
  fn negotiates_supported_or_latest_version() {
    assert_eq!(negotiate_version("2024-11-05"), "2024-11-05");
    assert_eq!(negotiate_version("2025-03-26"), "2025-03-26");
    assert_eq!(negotiate_version("1999-01-01"), LATEST_PROTOCOL_VERSION);
  }

  #[test]
  fn outgoing_messages_serialize_flat() {
    let ok: OutgoingMessage = Ok(JsonRpcResponse::success(RequestId::Number(7), json!({}))).into();
    assert_eq!(
      serde_json::to_value(&ok).unwrap(),
      json!({"jsonrpc": "2.0", "id": 7, "result": {}})
    );

    let err: OutgoingMessage = Err(JsonRpcError::method_not_found(RequestId::Number(8), "nope")).into();
    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(value["error"]["code"], -32601);
    assert_eq!(value["id"], 8);
  }
}
