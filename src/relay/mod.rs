//! The file relay service
//!
//! [`FileRelay`] owns every pipeline collaborator and is cheap to clone:
//! - [`pipeline`] - Batch submission (download, retry, publish, persist, report)
//!
//! Batches are processed one at a time. Within a batch every transfer and
//! every upload runs concurrently.

mod pipeline;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::publish::{DriveStore, Publisher, RemoteStore};
use crate::transfer::TransferUnit;
use crate::types::{Event, FileRecord};
use std::sync::Arc;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main relay instance (cloneable - all fields are Arc-wrapped or cheap)
#[derive(Clone)]
pub struct FileRelay {
    /// Database instance for persistence (wrapped in Arc for sharing across tasks)
    /// Public for integration tests to query stored records
    pub db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Downloads URLs into the staging directory
    pub(crate) transfer: TransferUnit,
    /// Uploads staged files to the remote store
    pub(crate) publisher: Publisher,
    /// Held for the duration of a batch; staging names are only unique within one
    pub(crate) batch_lock: Arc<tokio::sync::Mutex<()>>,
}

impl FileRelay {
    /// Create a relay publishing to `store`
    ///
    /// Validates the configuration, creates the staging directory and opens
    /// (or creates) the record store.
    pub async fn new(config: Config, store: Arc<dyn RemoteStore>) -> Result<Self> {
        config.validate()?;

        let transfer = TransferUnit::new(reqwest::Client::new(), &config.staging.upload_dir);
        transfer.ensure_upload_dir().await.map_err(|e| Error::Config {
            message: format!(
                "failed to create staging directory '{}': {}",
                config.staging.upload_dir.display(),
                e
            ),
            key: Some("staging.upload_dir".into()),
        })?;

        let db = Database::new(&config.persistence.database_path).await?;

        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let publisher = Publisher::new(store, config.publish.parent_folder_id.clone());

        tracing::info!(
            upload_dir = %config.staging.upload_dir.display(),
            database = %config.persistence.database_path.display(),
            store = publisher.store().name(),
            max_attempts = config.retry.max_attempts,
            "File relay initialized"
        );

        Ok(Self {
            db: Arc::new(db),
            event_tx,
            config: Arc::new(config),
            transfer,
            publisher,
            batch_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Create a relay publishing to Google Drive
    ///
    /// Requires a parent folder id in `config.publish`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use file_relay::{Config, FileRelay};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let mut config = Config::default();
    ///     config.publish.parent_folder_id = "1FolderId".into();
    ///     config.publish.drive.access_token = Some("ya29.token".into());
    ///
    ///     let relay = FileRelay::with_google_drive(config).await?;
    ///     let report = relay
    ///         .submit_batch(vec!["https://example.com/report.pdf".into()])
    ///         .await?;
    ///     println!("{:?}", report.succeeded);
    ///     Ok(())
    /// }
    /// ```
    pub async fn with_google_drive(config: Config) -> Result<Self> {
        config.validate_drive()?;
        let store = Arc::new(DriveStore::new(&config.publish.drive));
        Self::new(config, store).await
    }

    /// Subscribe to pipeline events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// A subscriber that falls behind by more than 1000 events receives `RecvError::Lagged`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use file_relay::{Config, FileRelay};
    /// use file_relay::publish::MemoryStore;
    /// use std::sync::Arc;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let relay = FileRelay::new(Config::default(), Arc::new(MemoryStore::new())).await?;
    ///
    ///     let mut events = relay.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "relay event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Every stored file record, oldest first
    pub async fn list_files(&self) -> Result<Vec<FileRecord>> {
        self.db.list_files().await
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server listens on `config.server.api.bind_address`
    /// (default: 127.0.0.1:3000).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let relay = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(relay, config).await })
    }
}
