//! The remote object store boundary

use crate::error::PublishError;
use async_trait::async_trait;

/// A remote store that can host files publicly
///
/// Publishing a file is three steps: upload the bytes, grant anonymous read
/// access, and derive the shareable URL from the returned object id.
/// Implementations own their own client and credentials.
///
/// # Examples
///
/// ```
/// use file_relay::publish::{MemoryStore, RemoteStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let id = store.upload(b"hello".to_vec(), "greeting.txt", "folder-1").await?;
/// store.set_public(&id).await?;
/// println!("{}", store.share_url(&id));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upload `content` as `name` inside the container `parent`
    ///
    /// # Returns
    ///
    /// The store's identifier for the new object
    async fn upload(
        &self,
        content: Vec<u8>,
        name: &str,
        parent: &str,
    ) -> Result<String, PublishError>;

    /// Grant anonymous read access to an uploaded object
    async fn set_public(&self, object_id: &str) -> Result<(), PublishError>;

    /// Shareable URL for an object
    fn share_url(&self, object_id: &str) -> String;

    /// Short name used in logs
    fn name(&self) -> &str;
}
