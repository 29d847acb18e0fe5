//! Core types for file-relay

use crate::error::{DownloadError, PublishError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

/// One URL to fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    /// Position of the URL in the submitted batch
    pub index: usize,
    /// Source URL as supplied by the caller
    pub url: String,
}

impl TransferRequest {
    /// Create a request for the URL at `index` in the batch
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }

    /// Build requests for a whole batch, indexed by position
    pub fn batch<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .enumerate()
            .map(|(index, url)| Self::new(index, url))
            .collect()
    }
}

/// Result of a single Transfer Unit
#[derive(Debug)]
pub enum TransferOutcome {
    /// The body was fully written to `local_path`
    Success {
        /// Staged file
        local_path: PathBuf,
    },
    /// The transfer failed and left nothing on disk
    Failure {
        /// Source URL
        url: String,
        /// Why it failed
        cause: DownloadError,
    },
}

impl From<std::result::Result<PathBuf, DownloadError>> for TransferOutcome {
    fn from(result: std::result::Result<PathBuf, DownloadError>) -> Self {
        match result {
            Ok(local_path) => TransferOutcome::Success { local_path },
            Err(cause) => TransferOutcome::Failure {
                url: cause.url().to_string(),
                cause,
            },
        }
    }
}

/// A file that was downloaded and is waiting to be published
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedArtifact {
    /// Position of the source URL in the submitted batch
    pub index: usize,
    /// Source URL
    pub url: String,
    /// Where the body was written
    pub local_path: PathBuf,
}

/// A URL whose most recent transfer attempt failed
#[derive(Clone, Debug)]
pub struct FailedTransfer {
    /// Position of the source URL in the submitted batch
    pub index: usize,
    /// Source URL
    pub url: String,
    /// The failure of the latest attempt
    pub error: DownloadError,
}

impl FailedTransfer {
    /// The request that would re-attempt this transfer
    pub fn request(&self) -> TransferRequest {
        TransferRequest::new(self.index, self.url.clone())
    }
}

/// Outcome of one Batch Downloader pass
///
/// Every input request lands in exactly one of the two lists, in input order.
#[derive(Clone, Debug, Default)]
pub struct BatchResult {
    /// Successfully staged files
    pub succeeded: Vec<StagedArtifact>,
    /// Requests that failed in this pass
    pub failed: Vec<FailedTransfer>,
}

impl BatchResult {
    /// Number of requests this result covers
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when the pass had no input
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A URL that still failed after every retry round
#[derive(Clone, Debug)]
pub struct ExhaustedUrl {
    /// Position of the source URL in the submitted batch
    pub index: usize,
    /// Source URL
    pub url: String,
    /// Number of retry rounds the URL went through
    pub attempts: u32,
    /// Failure of the final attempt
    pub last_error: DownloadError,
}

impl std::fmt::Display for ExhaustedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (failed after {} attempts)", self.url, self.attempts)
    }
}

/// A staged file now hosted by the remote store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PublishedArtifact {
    /// Shareable public URL
    pub remote_url: String,
    /// Name the file was uploaded under
    pub display_name: String,
}

/// A staged file that could not be published
///
/// The local file is moved under `{upload_dir}/failed/` with a unique
/// suffix, out of reach of later batches' staging names.
#[derive(Clone, Debug)]
pub struct PublishFailure {
    /// Source URL of the staged file
    pub source_url: String,
    /// Where the unpublished file was kept
    pub local_path: PathBuf,
    /// What went wrong
    pub error: PublishError,
}

impl std::fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (publish failed: {})", self.source_url, self.error)
    }
}

/// Unique identifier of a stored file record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String)]
pub struct FileId(pub Uuid);

impl FileId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FileId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A published file as recorded in the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileRecord {
    /// Record identifier
    pub id: FileId,
    /// Shareable public URL
    pub url: String,
    /// Display name
    pub name: String,
    /// When the record was written
    pub created_at: DateTime<Utc>,
}

/// Request body for POST /files
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitBatchRequest {
    /// URLs to fetch, in order
    pub urls: Vec<String>,
}

/// Consolidated result of a submitted batch
///
/// `succeeded` holds the shareable references of published files; `failed`
/// holds URLs that exhausted their retries, annotated with the attempt count.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchReport {
    /// Published references
    pub succeeded: Vec<String>,
    /// Annotated failed URLs
    pub failed: Vec<String>,
}

/// Response body for GET /files
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FileList {
    /// Every stored record
    pub data: Vec<FileRecord>,
}

/// Stage of the batch pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// First pass over every submitted URL
    Downloading,
    /// Retry rounds over the first-pass failures
    Retrying,
    /// Uploading staged files to the remote store
    Publishing,
    /// Writing records for published files
    Persisting,
    /// Report assembled
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Downloading => "downloading",
            PipelineStage::Retrying => "retrying",
            PipelineStage::Publishing => "publishing",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Event emitted while a batch moves through the pipeline
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch was accepted
    BatchStarted {
        /// Number of submitted URLs
        total: usize,
    },

    /// The pipeline entered a new stage
    StageChanged {
        /// The stage just entered
        stage: PipelineStage,
    },

    /// A transfer attempt failed (attempt 0 is the first pass)
    TransferFailed {
        /// Source URL
        url: String,
        /// Retry round, 0 for the first pass
        attempt: u32,
        /// Failure message
        error: String,
    },

    /// A retry round is about to run
    RetryRound {
        /// 1-based round number
        attempt: u32,
        /// URLs still failing going into the round
        pending: usize,
    },

    /// A file was published
    Published {
        /// Name the file was uploaded under
        name: String,
        /// Shareable public URL
        url: String,
    },

    /// A staged file could not be published
    PublishFailed {
        /// Source URL
        url: String,
        /// Failure message
        error: String,
    },

    /// Records were written for published files
    Persisted {
        /// Number of records written
        count: usize,
    },

    /// The batch finished
    BatchFinished {
        /// Number of published files
        succeeded: usize,
        /// Number of reported failures
        failed: usize,
    },
}

impl Event {
    /// Event name, matching the serialized `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Event::BatchStarted { .. } => "batch_started",
            Event::StageChanged { .. } => "stage_changed",
            Event::TransferFailed { .. } => "transfer_failed",
            Event::RetryRound { .. } => "retry_round",
            Event::Published { .. } => "published",
            Event::PublishFailed { .. } => "publish_failed",
            Event::Persisted { .. } => "persisted",
            Event::BatchFinished { .. } => "batch_finished",
        }
    }
}
