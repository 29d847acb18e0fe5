//! Shared test helpers for creating FileRelay instances in tests.

use crate::config::Config;
use crate::publish::MemoryStore;
use crate::relay::FileRelay;
use std::sync::Arc;
use tempfile::tempdir;

/// Configuration rooted in a temp dir with immediate retries
pub(crate) fn test_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.persistence.database_path = root.join("test.db");
    config.staging.upload_dir = root.join("uploads");
    config.publish.parent_folder_id = "test-folder".into();
    config.retry.jitter = false;
    config
}

/// Helper to create a test FileRelay backed by the given store.
/// Returns the relay and the tempdir (which must be kept alive).
pub(crate) async fn create_test_relay_with(
    store: Arc<MemoryStore>,
    configure: impl FnOnce(&mut Config),
) -> (FileRelay, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = test_config(temp_dir.path());
    configure(&mut config);

    let relay = FileRelay::new(config, store).await.unwrap();
    (relay, temp_dir)
}

/// Helper to create a test FileRelay backed by an empty memory store.
pub(crate) async fn create_test_relay() -> (FileRelay, Arc<MemoryStore>, tempfile::TempDir) {
    let store = Arc::new(MemoryStore::new());
    let (relay, temp_dir) = create_test_relay_with(store.clone(), |_| {}).await;
    (relay, store, temp_dir)
}

/// Drain every event currently buffered in a receiver
pub(crate) fn drain_events(
    rx: &mut tokio::sync::broadcast::Receiver<crate::types::Event>,
) -> Vec<crate::types::Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
