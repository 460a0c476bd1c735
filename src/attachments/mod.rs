//! Confluence attachment handling.
//!
//! [`model`] turns raw listing payloads into [`Attachment`] records with a
//! resolvable download URL; [`fetcher`] lists, resolves and downloads them.

pub mod fetcher;
pub mod model;

pub use fetcher::{
  AttachmentFetcher, DEFAULT_FILENAME, DOWNLOAD_FAILED_ERROR, DownloadResult, DownloadedFile, FailedDownload,
  NO_URL_ERROR, safe_filename,
};
pub use model::Attachment;
