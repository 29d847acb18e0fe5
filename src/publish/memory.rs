//! In-process remote store

use super::traits::RemoteStore;
use crate::error::PublishError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// An object held by a [`MemoryStore`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// Object identifier
    pub id: String,
    /// Name the object was uploaded under
    pub name: String,
    /// Container the object was placed in
    pub parent: String,
    /// Uploaded bytes
    pub content: Vec<u8>,
    /// Whether anonymous read access was granted
    pub public: bool,
}

/// A [`RemoteStore`] that keeps objects in memory
///
/// Useful for running the pipeline without network credentials and for
/// tests. Individual uploads or permission grants can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    next_id: AtomicU64,
    rejected_names: HashSet<String>,
    reject_permissions: bool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every upload of an object called `name`
    pub fn rejecting_upload(mut self, name: impl Into<String>) -> Self {
        self.rejected_names.insert(name.into());
        self
    }

    /// Fail every permission grant
    pub fn rejecting_permissions(mut self) -> Self {
        self.reject_permissions = true;
        self
    }

    /// Every stored object, ordered by id
    pub async fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().await.values().cloned().collect()
    }

    /// Look up one object
    pub async fn get(&self, object_id: &str) -> Option<StoredObject> {
        self.objects.lock().await.get(object_id).cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn upload(
        &self,
        content: Vec<u8>,
        name: &str,
        parent: &str,
    ) -> Result<String, PublishError> {
        if self.rejected_names.contains(name) {
            return Err(PublishError::UploadFailed {
                name: name.to_string(),
                reason: "rejected by memory store".into(),
            });
        }

        let id = format!("obj-{:06}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.objects.lock().await.insert(
            id.clone(),
            StoredObject {
                id: id.clone(),
                name: name.to_string(),
                parent: parent.to_string(),
                content,
                public: false,
            },
        );
        Ok(id)
    }

    async fn set_public(&self, object_id: &str) -> Result<(), PublishError> {
        if self.reject_permissions {
            return Err(PublishError::PermissionFailed {
                object_id: object_id.to_string(),
                reason: "rejected by memory store".into(),
            });
        }

        let mut objects = self.objects.lock().await;
        let object = objects
            .get_mut(object_id)
            .ok_or_else(|| PublishError::PermissionFailed {
                object_id: object_id.to_string(),
                reason: "no such object".into(),
            })?;
        object.public = true;
        Ok(())
    }

    fn share_url(&self, object_id: &str) -> String {
        format!("memory://objects/{object_id}")
    }

    fn name(&self) -> &str {
        "memory"
    }
}
