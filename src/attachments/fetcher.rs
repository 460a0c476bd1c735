//! Attachment retrieval: single-file downloads and whole-page batches.
//!
//! Per-file failures are recovered here and reported in
//! [`DownloadResult::failed`]; only a failed listing aborts a batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use serde::Serialize;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, error, info, warn};

use super::model::Attachment;
use crate::atlassian::{ByteStream, ConfluenceApi, FetchSession};
use crate::error::{BatchError, DownloadError};

/// Write buffer size used while streaming a download to disk.
const CHUNK_SIZE: usize = 8192;

/// Filename used when an attachment title has no usable final component.
pub const DEFAULT_FILENAME: &str = "attachment";

/// Failure reason for attachments without a resolvable URL.
pub const NO_URL_ERROR: &str = "No URL available";

/// Failure reason for attachments whose download did not complete.
pub const DOWNLOAD_FAILED_ERROR: &str = "Download failed";

/// A file that was written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedFile {
  /// Sanitized filename used on disk.
  pub filename: String,
  /// Absolute path of the written file.
  pub path: PathBuf,
  /// Size reported by the attachment metadata.
  pub size: Option<u64>,
}

/// An attachment that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
  /// Filename (or raw title when no URL could be resolved).
  pub filename: Option<String>,
  /// Short failure reason.
  pub error: String,
}

/// Aggregate outcome of [`AttachmentFetcher::download_page_attachments`].
///
/// `downloaded.len() + failed.len() == total` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
  /// `true` once the listing succeeded; per-file failures live in `failed`.
  pub success: bool,
  /// Page whose attachments were requested.
  pub page_id: String,
  /// Number of attachments listed for the page.
  pub total: usize,
  /// Explanation for an empty listing.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  /// Files written, in listing order.
  pub downloaded: Vec<DownloadedFile>,
  /// Attachments that failed, in listing order.
  pub failed: Vec<FailedDownload>,
}

enum Outcome {
  Downloaded(DownloadedFile),
  Failed(FailedDownload),
}

/// Downloads Confluence attachments using a borrowed listing service and
/// HTTP session.
pub struct AttachmentFetcher<'a> {
  listing: &'a dyn ConfluenceApi,
  session: &'a dyn FetchSession,
  concurrency: usize,
}

impl<'a> AttachmentFetcher<'a> {
  /// Create a fetcher that downloads one attachment at a time.
  ///
  /// # Arguments
  /// * `listing` - Lists page attachments and provides the instance base URL.
  /// * `session` - Authenticated session used for the file transfers.
  pub fn new(listing: &'a dyn ConfluenceApi, session: &'a dyn FetchSession) -> Self {
    Self {
      listing,
      session,
      concurrency: 1,
    }
  }

  /// Allow up to `concurrency` downloads in flight. Results keep listing
  /// order regardless of completion order. Values below 1 are treated as 1.
  pub fn with_concurrency(mut self, concurrency: usize) -> Self {
    self.concurrency = concurrency.max(1);
    self
  }

  /// Download `url` to `target_path`, reporting success as a boolean.
  ///
  /// Never fails: every error is logged and turned into `false`.
  pub async fn download_attachment(&self, url: &str, target_path: &Path) -> bool {
    match self.fetch_to_file(url, target_path).await {
      Ok(bytes) => {
        info!(url, path = %target_path.display(), bytes, "Downloaded attachment");
        true
      }
      Err(err) => {
        error!(url, path = %target_path.display(), error = %err, "Error downloading attachment");
        false
      }
    }
  }

  /// Stream `url` into `target_path` and return the number of bytes written.
  ///
  /// The path is made absolute and its parent directories are created. The
  /// body is written to a hidden `.part` sibling that replaces the target
  /// only once it is complete; on any failure the `.part` file is removed and
  /// an existing file at `target_path` is left untouched.
  ///
  /// # Errors
  /// Returns [`DownloadError`] for an empty URL, a failed request, a failed
  /// write, or a file that is missing after the write.
  pub async fn fetch_to_file(&self, url: &str, target_path: &Path) -> Result<u64, DownloadError> {
    if url.is_empty() {
      return Err(DownloadError::MissingUrl);
    }

    let target = std::path::absolute(target_path).map_err(io_error(target_path))?;
    info!(url, path = %target.display(), "Downloading attachment");

    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).await.map_err(io_error(parent))?;
    }

    let stream = self.session.fetch(url).await?;

    let part = part_path(&target);
    let result = match write_stream(stream, &part).await {
      Ok(written) => fs::rename(&part, &target)
        .await
        .map(|()| written)
        .map_err(io_error(&target)),
      Err(err) => Err(err),
    };
    if result.is_err() {
      let _ = fs::remove_file(&part).await;
    }
    let written = result?;

    if !fs::try_exists(&target).await.unwrap_or(false) {
      return Err(DownloadError::NotCreated(target));
    }

    Ok(written)
  }

  /// Download every attachment of `page_id` into `target_dir`.
  ///
  /// # Errors
  /// Returns [`BatchError::Listing`] when the listing call fails (the API
  /// error is passed through unchanged) and [`BatchError::TargetDir`] when
  /// the directory cannot be created. Per-file failures never error.
  pub async fn download_page_attachments(&self, page_id: &str, target_dir: &Path) -> Result<DownloadResult, BatchError> {
    let target_dir = std::path::absolute(target_dir).map_err(|source| BatchError::TargetDir {
      path: target_dir.to_path_buf(),
      source,
    })?;
    info!(page_id, dir = %target_dir.display(), "Downloading page attachments");

    fs::create_dir_all(&target_dir)
      .await
      .map_err(|source| BatchError::TargetDir {
        path: target_dir.clone(),
        source,
      })?;

    let payloads = self.listing.get_attachments_for_page(page_id).await?;

    if payloads.is_empty() {
      return Ok(DownloadResult {
        success: true,
        page_id: page_id.to_string(),
        total: 0,
        message: Some(format!("No attachments found for page {page_id}")),
        downloaded: Vec::new(),
        failed: Vec::new(),
      });
    }

    let total = payloads.len();
    let base_url = self.listing.base_url();
    let target_dir = target_dir.as_path();

    // Names are reserved up front so concurrent downloads never share a path.
    let mut taken = HashSet::new();
    let planned: Vec<Planned> = payloads
      .iter()
      .map(Attachment::from_api_response)
      .map(|attachment| {
        let url = attachment.download_url(base_url);
        let filename = url
          .as_ref()
          .map(|_| unique_filename(safe_filename(attachment.title.as_deref()), &mut taken));
        Planned { attachment, url, filename }
      })
      .collect();

    let outcomes: Vec<Outcome> = futures::stream::iter(planned)
      .map(|planned| self.process(planned, target_dir))
      .buffered(self.concurrency)
      .collect()
      .await;

    let mut downloaded = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
      match outcome {
        Outcome::Downloaded(file) => downloaded.push(file),
        Outcome::Failed(failure) => failed.push(failure),
      }
    }

    info!(
      page_id,
      total,
      downloaded = downloaded.len(),
      failed = failed.len(),
      "Finished page attachments"
    );

    Ok(DownloadResult {
      success: true,
      page_id: page_id.to_string(),
      total,
      message: None,
      downloaded,
      failed,
    })
  }

  async fn process(&self, planned: Planned, target_dir: &Path) -> Outcome {
    let Planned { attachment, url, filename } = planned;
    debug!(attachment = %attachment.summary(), "Processing attachment");

    let (Some(url), Some(filename)) = (url, filename) else {
      warn!(title = ?attachment.title, "No download URL for attachment");
      return Outcome::Failed(FailedDownload {
        filename: attachment.title,
        error: NO_URL_ERROR.to_string(),
      });
    };

    let path = target_dir.join(&filename);

    if self.download_attachment(&url, &path).await {
      Outcome::Downloaded(DownloadedFile {
        filename,
        path,
        size: attachment.file_size,
      })
    } else {
      Outcome::Failed(FailedDownload {
        filename: Some(filename),
        error: DOWNLOAD_FAILED_ERROR.to_string(),
      })
    }
  }
}

/// An attachment with its resolved URL and the filename reserved for it.
struct Planned {
  attachment: Attachment,
  url: Option<String>,
  filename: Option<String>,
}

/// Reduce an attachment title to a filename that stays inside the target
/// directory.
///
/// Only the final `/`- or `\`-separated component is kept. Missing titles
/// and components that are empty, `.` or `..` become [`DEFAULT_FILENAME`].
pub fn safe_filename(title: Option<&str>) -> String {
  let candidate = title
    .and_then(|title| title.rsplit(['/', '\\']).next())
    .unwrap_or_default();

  match candidate.trim() {
    "" | "." | ".." => DEFAULT_FILENAME.to_string(),
    _ => candidate.to_string(),
  }
}

/// Return `name`, or `name (n).ext` with the smallest free `n` when `name`
/// is already taken. Comparison ignores case so names also stay distinct on
/// case-insensitive filesystems.
fn unique_filename(name: String, taken: &mut HashSet<String>) -> String {
  if taken.insert(name.to_lowercase()) {
    return name;
  }

  let (stem, ext) = match name.rfind('.') {
    Some(dot) if dot > 0 => name.split_at(dot),
    _ => (name.as_str(), ""),
  };

  let mut n = 1;
  loop {
    let candidate = format!("{stem} ({n}){ext}");
    if taken.insert(candidate.to_lowercase()) {
      return candidate;
    }
    n += 1;
  }
}

/// Hidden sibling of `target` that receives the body while it streams.
fn part_path(target: &Path) -> PathBuf {
  static NEXT_PART: AtomicU64 = AtomicU64::new(0);

  let name = target
    .file_name()
    .map_or_else(|| DEFAULT_FILENAME.into(), |name| name.to_string_lossy());
  let n = NEXT_PART.fetch_add(1, Ordering::Relaxed);
  target.with_file_name(format!(".{name}.{}-{n}.part", std::process::id()))
}

async fn write_stream(mut stream: ByteStream, path: &Path) -> Result<u64, DownloadError> {
  let file = fs::File::create(path).await.map_err(io_error(path))?;
  let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
  let mut written = 0u64;

  while let Some(chunk) = stream.next().await {
    let chunk = chunk?;
    writer.write_all(&chunk).await.map_err(io_error(path))?;
    written += chunk.len() as u64;
  }

  writer.flush().await.map_err(io_error(path))?;
  Ok(written)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DownloadError + '_ {
  move |source| DownloadError::Io {
    path: path.to_path_buf(),
    source,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn safe_filename_keeps_final_component() {
    assert_eq!(safe_filename(Some("../../etc/passwd")), "passwd");
    assert_eq!(safe_filename(Some("folder\\nested\\report.pdf")), "report.pdf");
    assert_eq!(safe_filename(Some("diagram.png")), "diagram.png");
  }

  #[test]
  fn safe_filename_falls_back_for_unusable_titles() {
    assert_eq!(safe_filename(None), DEFAULT_FILENAME);
    assert_eq!(safe_filename(Some("")), DEFAULT_FILENAME);
    assert_eq!(safe_filename(Some("..")), DEFAULT_FILENAME);
    assert_eq!(safe_filename(Some("a/..")), DEFAULT_FILENAME);
    assert_eq!(safe_filename(Some("trailing/")), DEFAULT_FILENAME);
  }

  #[test]
  fn repeated_names_get_numbered_suffixes() {
    let mut taken = HashSet::new();
    let names: Vec<String> = ["a.txt", "a.txt", "A.TXT", "a (1).txt", "README", "README", ".env", ".env"]
      .into_iter()
      .map(|name| unique_filename(name.to_string(), &mut taken))
      .collect();

    assert_eq!(
      names,
      ["a.txt", "a (1).txt", "A (2).TXT", "a (1) (1).txt", "README", "README (1)", ".env", ".env (1)"]
    );
  }

  #[test]
  fn part_files_are_hidden_siblings() {
    let target = Path::new("/tmp/out/report.pdf");
    let first = part_path(target);
    let second = part_path(target);

    assert_eq!(first.parent(), target.parent());
    let name = first.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(".report.pdf."));
    assert!(name.ends_with(".part"));
    assert_ne!(first, second);
  }

  #[test]
  fn download_result_serializes_snake_case_and_skips_missing_message() {
    let result = DownloadResult {
      success: true,
      page_id: "1".to_string(),
      total: 1,
      message: None,
      downloaded: vec![DownloadedFile {
        filename: "a.txt".to_string(),
        path: PathBuf::from("/tmp/a.txt"),
        size: Some(3),
      }],
      failed: Vec::new(),
    };

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["page_id"], "1");
    assert_eq!(value["downloaded"][0]["size"], 3);
    assert!(value.get("message").is_none());
  }
}
