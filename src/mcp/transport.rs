//! Newline-delimited JSON transport.
//!
//! One JSON-RPC message per line, UTF-8, no embedded newlines. On stdio,
//! stdout carries only protocol frames; logs go to stderr.

use std::io;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// One line read from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
  Text(String),
  /// The line was not valid UTF-8.
  InvalidUtf8,
}

/// Line transport over any buffered reader and writer.
pub struct LineTransport<R, W> {
  reader: R,
  writer: W,
}

/// The transport used in production.
pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
  pub fn stdio() -> Self {
    Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
  }
}

impl<R, W> LineTransport<R, W>
where
  R: AsyncBufRead + Unpin,
  W: AsyncWrite + Unpin,
{
  pub fn new(reader: R, writer: W) -> Self {
    Self { reader, writer }
  }

  /// Read the next line without its terminator. `None` means EOF.
  ///
  /// A line that is not valid UTF-8 is consumed and reported as
  /// [`Frame::InvalidUtf8`] so the caller can reply and keep reading.
  ///
  /// # Errors
  /// Propagates read errors from the underlying reader.
  pub async fn read_line(&mut self) -> io::Result<Option<Frame>> {
    let mut buf = Vec::new();
    if self.reader.read_until(b'\n', &mut buf).await? == 0 {
      return Ok(None);
    }

    while matches!(buf.last(), Some(b'\n' | b'\r')) {
      buf.pop();
    }

    Ok(Some(match String::from_utf8(buf) {
      Ok(line) => Frame::Text(line),
      Err(_) => Frame::InvalidUtf8,
    }))
  }

  /// Serialize `message` on a single line and flush.
  ///
  /// # Errors
  /// Returns an error if serialization or the write fails.
  pub async fn write_message<T: Serialize>(&mut self, message: &T) -> io::Result<()> {
    let json = serde_json::to_string(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    debug_assert!(!json.contains('\n'), "JSON frames must not contain newlines");

    self.writer.write_all(json.as_bytes()).await?;
    self.writer.write_all(b"\n").await?;
    self.writer.flush().await
  }

  /// Consume the transport, returning the writer.
  pub fn into_writer(self) -> W {
    self.writer
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn text(line: &str) -> Option<Frame> {
    Some(Frame::Text(line.to_string()))
  }

  #[tokio::test]
  async fn reads_lines_and_strips_terminators() {
    let input: &[u8] = b"first\r\nsecond\nthird";
    let mut transport = LineTransport::new(input, Vec::new());

    assert_eq!(transport.read_line().await.unwrap(), text("first"));
    assert_eq!(transport.read_line().await.unwrap(), text("second"));
    assert_eq!(transport.read_line().await.unwrap(), text("third"));
    assert_eq!(transport.read_line().await.unwrap(), None);
  }

  #[tokio::test]
  async fn invalid_utf8_line_is_reported_and_skipped() {
    let input: &[u8] = b"\xff\xfe\n{\"ok\":true}\n";
    let mut transport = LineTransport::new(input, Vec::new());

    assert_eq!(transport.read_line().await.unwrap(), Some(Frame::InvalidUtf8));
    assert_eq!(transport.read_line().await.unwrap(), text(r#"{"ok":true}"#));
    assert_eq!(transport.read_line().await.unwrap(), None);
  }

  #[tokio::test]
  async fn writes_one_frame_per_line() {
    let mut transport = LineTransport::new(&b""[..], Vec::new());
    transport
      .write_message(&json!({"text": "line one\nline two"}))
      .await
      .unwrap();
    transport.write_message(&json!({"n": 2})).await.unwrap();

    let output = String::from_utf8(transport.into_writer()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], r#"{"n":2}"#);
  }
}
