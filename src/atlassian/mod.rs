//! Atlassian module providing the API traits, the shared HTTP plumbing, the
//! Confluence and Jira clients, data models and URL helpers.

pub mod api;
pub mod confluence;
pub mod http;
pub mod jira;
pub mod models;
pub mod url;

pub use api::{ByteStream, ConfluenceApi, FetchSession, JiraApi};
pub use confluence::ConfluenceClient;
pub use http::{Auth, ClientOptions, RestClient};
pub use jira::JiraClient;
pub use models::{ConfluenceUser, JiraUser};
pub use url::{PageReference, is_page_id, parse_page_reference};
