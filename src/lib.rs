//! # file-relay
//!
//! Fetch batches of URLs, publish the files to a remote store and keep a
//! record of every published file.
//!
//! ## Design Philosophy
//!
//! file-relay is designed to be:
//! - **Settle-all** - One failing URL never cancels the rest of its batch
//! - **Sensible defaults** - Works out of the box with only a folder id and a token
//! - **Library-first** - The HTTP API and binary are thin layers over [`FileRelay`]
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use file_relay::{Config, FileRelay};
//! use file_relay::publish::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relay = FileRelay::new(Config::default(), Arc::new(MemoryStore::new())).await?;
//!
//!     // Subscribe to events
//!     let mut events = relay.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = relay
//!         .submit_batch(vec!["https://example.com/report.pdf".to_string()])
//!         .await?;
//!     println!("published: {:?}, failed: {:?}", report.succeeded, report.failed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Remote stores and publishing
pub mod publish;
/// Batch pipeline orchestration
pub mod relay;
/// Retry rounds with exponential backoff
pub mod retry;
/// Streaming downloads into the staging directory
pub mod transfer;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use error::{
    ApiError, DatabaseError, DownloadError, Error, ErrorDetail, PublishError, Result,
    ToHttpStatus,
};
pub use publish::{DriveStore, MemoryStore, Publisher, RemoteStore};
pub use relay::FileRelay;
pub use types::{BatchReport, Event, FileId, FileRecord, PipelineStage};

/// Helper function to serve the API until a termination signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// In-flight requests are allowed to finish before this returns.
///
/// # Example
///
/// ```no_run
/// use file_relay::{Config, FileRelay, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let relay = FileRelay::with_google_drive(Config::default()).await?;
///
///     // Serve with automatic signal handling
///     run_with_shutdown(Arc::new(relay)).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(relay: std::sync::Arc<FileRelay>) -> Result<()> {
    let config = relay.get_config();
    api::start_api_server_with_shutdown(relay, config, wait_for_signal()).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
