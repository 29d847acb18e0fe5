//! Publishing staged files to a remote store
//!
//! The core abstraction is the [`RemoteStore`] trait. Two implementations are
//! provided:
//!
//! - [`DriveStore`]: Google Drive over the v3 REST API
//! - [`MemoryStore`]: in-process store without network access
//!
//! [`Publisher`] drives a store over a set of staged files: upload, grant
//! public read access, derive the share URL and remove the local copy.
//! Uploads are never retried; a file that fails to publish is set aside in
//! the [`FAILED_DIR`] subdirectory of the staging directory.

use crate::error::PublishError;
use crate::types::{PublishFailure, PublishedArtifact, StagedArtifact};
use crate::utils::display_name;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod drive;
mod memory;
mod traits;

pub use drive::DriveStore;
pub use memory::{MemoryStore, StoredObject};
pub use traits::RemoteStore;

/// Subdirectory of the staging directory holding files that failed to publish
pub const FAILED_DIR: &str = "failed";

/// Outcome of publishing a set of staged files
#[derive(Clone, Debug, Default)]
pub struct PublishOutcome {
    /// Files now hosted remotely, in input order
    pub published: Vec<PublishedArtifact>,
    /// Files that could not be published, in input order
    pub failed: Vec<PublishFailure>,
}

/// Publishes staged files into one parent container of a [`RemoteStore`]
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn RemoteStore>,
    parent: String,
}

impl Publisher {
    /// Create a publisher placing every upload under `parent`
    pub fn new(store: Arc<dyn RemoteStore>, parent: impl Into<String>) -> Self {
        Self {
            store,
            parent: parent.into(),
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    /// Publish one staged file
    ///
    /// The local file is removed once the object is public. If the object
    /// was uploaded but could not be made public it stays in the store and
    /// the local file is kept.
    pub async fn publish(
        &self,
        artifact: &StagedArtifact,
    ) -> Result<PublishedArtifact, PublishError> {
        let name = display_name(&artifact.local_path);

        let content = tokio::fs::read(&artifact.local_path)
            .await
            .map_err(|e| PublishError::ReadFailed {
                path: artifact.local_path.clone(),
                reason: e.to_string(),
            })?;

        let object_id = self.store.upload(content, &name, &self.parent).await?;

        if let Err(e) = self.store.set_public(&object_id).await {
            tracing::error!(
                store = self.store.name(),
                object_id = %object_id,
                name = %name,
                "Uploaded object left private"
            );
            return Err(e);
        }

        let remote_url = self.store.share_url(&object_id);

        if let Err(e) = tokio::fs::remove_file(&artifact.local_path).await {
            tracing::warn!(
                path = %artifact.local_path.display(),
                error = %e,
                "Published file could not be removed from staging"
            );
        }

        tracing::debug!(name = %name, remote_url = %remote_url, "File published");

        Ok(PublishedArtifact {
            remote_url,
            display_name: name,
        })
    }

    /// Publish every staged file concurrently
    ///
    /// Failures are logged and returned; they never stop the other uploads.
    pub async fn publish_all(&self, artifacts: Vec<StagedArtifact>) -> PublishOutcome {
        let attempts = artifacts.into_iter().map(|artifact| async move {
            let result = self.publish(&artifact).await;
            (artifact, result)
        });

        let mut outcome = PublishOutcome::default();
        for (artifact, result) in join_all(attempts).await {
            match result {
                Ok(published) => outcome.published.push(published),
                Err(error) => {
                    let local_path = set_aside(&artifact.local_path).await;
                    tracing::error!(
                        store = self.store.name(),
                        url = %artifact.url,
                        path = %local_path.display(),
                        error = %error,
                        "Failed to publish file"
                    );
                    outcome.failed.push(PublishFailure {
                        source_url: artifact.url,
                        local_path,
                        error,
                    });
                }
            }
        }

        outcome
    }
}

/// Move an unpublished file to `{staging}/failed/{name}_{uuid}`
///
/// Returns the new path, or the old one if the file could not be moved.
async fn set_aside(path: &Path) -> PathBuf {
    let Some(staging) = path.parent() else {
        return path.to_path_buf();
    };
    let failed_dir = staging.join(FAILED_DIR);
    let target = failed_dir.join(format!(
        "{}_{}",
        display_name(path),
        uuid::Uuid::new_v4().simple()
    ));

    let moved = async {
        tokio::fs::create_dir_all(&failed_dir).await?;
        tokio::fs::rename(path, &target).await
    }
    .await;

    match moved {
        Ok(()) => target,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Unpublished file could not be set aside"
                );
            }
            path.to_path_buf()
        }
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("store", &self.store.name())
            .field("parent", &self.parent)
            .finish()
    }
}
