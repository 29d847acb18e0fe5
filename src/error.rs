//! Error types for file-relay
//!
//! This module provides the error handling for the library, including:
//! - Per-stage error types (download, publish, database)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for file-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for file-relay
///
/// Only pipeline-level faults travel through this type to callers. Per-item
/// download and publish failures are collected as data in the batch report.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "upload_dir")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A single transfer failed
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Upload to the remote store failed
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A stored row could not be decoded
    #[error("corrupt record {id}: {reason}")]
    CorruptRecord {
        /// Identifier of the offending row
        id: String,
        /// Why decoding failed
        reason: String,
    },
}

/// Failure of a single Transfer Unit
///
/// Every variant carries the URL it belongs to so the retry coordinator can
/// report it without extra bookkeeping.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// The input string is not a fetchable URL
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected input
        url: String,
        /// Parser message
        reason: String,
    },

    /// The request could not be sent or no response arrived
    #[error("failed to reach {url}: {reason}")]
    Unreachable {
        /// The URL being fetched
        url: String,
        /// Underlying client error
        reason: String,
    },

    /// The server answered with a non-success status
    #[error("failed to download {url}: HTTP {status}")]
    HttpStatus {
        /// The URL being fetched
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The body stream failed after the transfer started
    #[error("error while downloading {url}: {reason}")]
    Stream {
        /// The URL being fetched
        url: String,
        /// Underlying stream error
        reason: String,
    },

    /// The staging file could not be created or written
    #[error("failed to stage {url} at {path}: {reason}")]
    Staging {
        /// The URL being fetched
        url: String,
        /// The local path that failed
        path: PathBuf,
        /// Underlying I/O error
        reason: String,
    },
}

impl DownloadError {
    /// The URL this failure belongs to
    pub fn url(&self) -> &str {
        match self {
            DownloadError::InvalidUrl { url, .. }
            | DownloadError::Unreachable { url, .. }
            | DownloadError::HttpStatus { url, .. }
            | DownloadError::Stream { url, .. }
            | DownloadError::Staging { url, .. } => url,
        }
    }
}

/// Failure while publishing a staged artifact to the remote store
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The staged artifact could not be read
    #[error("failed to read staged file {path}: {reason}")]
    ReadFailed {
        /// Local artifact path
        path: PathBuf,
        /// Underlying I/O error
        reason: String,
    },

    /// The upload request failed or was rejected
    #[error("upload of {name} failed: {reason}")]
    UploadFailed {
        /// Display name used for the upload
        name: String,
        /// Why the store rejected it
        reason: String,
    },

    /// The object was uploaded but could not be made public
    #[error("failed to make object {object_id} public: {reason}")]
    PermissionFailed {
        /// Remote object identifier
        object_id: String,
        /// Why the store rejected it
        reason: String,
    },

    /// The store accepted the upload but returned no usable identifier
    #[error("remote store returned no object id for {name}")]
    MissingObjectId {
        /// Display name used for the upload
        name: String,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "database_error",
///     "message": "database error: query failed: disk I/O error"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "database_error", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("unauthorized", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,

            // Item-level failures that escaped the pipeline
            Error::Download(_) => 502,
            Error::Publish(_) => 502,

            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::Download(e) => match e {
                DownloadError::InvalidUrl { .. } => "invalid_url",
                DownloadError::Unreachable { .. } => "unreachable",
                DownloadError::HttpStatus { .. } => "http_status",
                DownloadError::Stream { .. } => "stream_error",
                DownloadError::Staging { .. } => "staging_error",
            },
            Error::Publish(e) => match e {
                PublishError::ReadFailed { .. } => "read_failed",
                PublishError::UploadFailed { .. } => "upload_failed",
                PublishError::PermissionFailed { .. } => "permission_failed",
                PublishError::MissingObjectId { .. } => "missing_object_id",
            },
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({ "key": key })),
            Error::Download(e) => Some(serde_json::json!({ "url": e.url() })),
            Error::Publish(PublishError::ReadFailed { path, .. }) => {
                Some(serde_json::json!({ "path": path }))
            }
            Error::Publish(PublishError::PermissionFailed { object_id, .. }) => {
                Some(serde_json::json!({ "object_id": object_id }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
