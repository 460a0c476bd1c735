//! Model Context Protocol server over stdio.
//!
//! ```text
//! stdin ──▶ transport ──▶ protocol::parse_message ──▶ server ──▶ tools
//!                                                        │
//! stdout ◀── transport ◀────────── replies ◀─────────────┘
//! ```

pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};
pub use server::{ConfluenceHandle, McpServer, ServerOptions, ServerState, Services};
pub use transport::{Frame, LineTransport, StdioTransport};
