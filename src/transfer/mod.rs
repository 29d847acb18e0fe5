//! Fetching URLs into the staging directory
//!
//! - [`TransferUnit`] streams one URL into one staged file
//! - [`batch`] fans a list of URLs out over transfer units and settles them all

use crate::error::DownloadError;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

pub mod batch;

pub use batch::download_batch;

/// Downloads a single URL into a named file in the staging directory
///
/// Cheap to clone: the HTTP client and directory are shared.
#[derive(Clone, Debug)]
pub struct TransferUnit {
    client: reqwest::Client,
    upload_dir: Arc<PathBuf>,
}

impl TransferUnit {
    /// Create a transfer unit writing into `upload_dir`
    pub fn new(client: reqwest::Client, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            upload_dir: Arc::new(upload_dir.into()),
        }
    }

    /// The staging directory
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Create the staging directory if it does not exist yet
    pub async fn ensure_upload_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.upload_dir.as_path()).await
    }

    /// Stream `url` into `{upload_dir}/{file_name}` and return the path
    ///
    /// The body is written chunk by chunk. If anything fails after the file
    /// was created, the partial file is removed before the error is returned.
    pub async fn fetch(&self, url: &str, file_name: &str) -> Result<PathBuf, DownloadError> {
        let parsed = url::Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let response =
            self.client
                .get(parsed)
                .send()
                .await
                .map_err(|e| DownloadError::Unreachable {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let path = self.upload_dir.join(file_name);
        let staging_error = |path: &Path, e: std::io::Error| DownloadError::Staging {
            url: url.to_string(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut staged = StagedFile::create(&path)
            .await
            .map_err(|e| staging_error(&path, e))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let written = match chunk {
                Ok(bytes) => staged
                    .write_all(&bytes)
                    .await
                    .map_err(|e| staging_error(&path, e)),
                Err(e) => Err(DownloadError::Stream {
                    url: url.to_string(),
                    reason: e.to_string(),
                }),
            };

            if let Err(err) = written {
                staged.discard().await;
                return Err(err);
            }
        }

        let bytes = staged.written;
        let path = staged
            .commit()
            .await
            .map_err(|e| staging_error(&path, e))?;

        tracing::debug!(url = %url, path = %path.display(), bytes, "Transfer complete");
        Ok(path)
    }
}

/// A staging file that is deleted unless explicitly committed
///
/// [`StagedFile::discard`] is the normal error path; `Drop` covers panics
/// and futures dropped mid-transfer.
struct StagedFile {
    path: PathBuf,
    file: Option<tokio::fs::File>,
    written: u64,
    armed: bool,
}

impl StagedFile {
    async fn create(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            written: 0,
            armed: true,
        })
    }

    async fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("staged file already closed"))?;
        file.write_all(bytes).await?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Flush to disk and keep the file
    async fn commit(mut self) -> std::io::Result<PathBuf> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        self.armed = false;
        Ok(self.path.clone())
    }

    /// Close and remove the partial file
    async fn discard(mut self) {
        if let Some(mut file) = self.file.take() {
            // Wait for any in-flight write before unlinking
            let _ = file.flush().await;
        }
        if let Err(e) = tokio::fs::remove_file(&self.path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial file");
        }
        self.armed = false;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        drop(self.file.take());
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial file");
        }
    }
}
