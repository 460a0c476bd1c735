//! Atlassian MCP server library
//!
//! Downloads Confluence page attachments and reports Jira/Confluence
//! connection status, exposed as Model Context Protocol tools over stdio and
//! as terminal subcommands.

pub mod atlassian;
pub mod attachments;
pub mod cli;
pub mod color;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod mcp;
pub mod status;
