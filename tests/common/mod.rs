//! Common test utilities for file-relay integration tests

use file_relay::{Config, DriveStore, FileRelay};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Folder every test publishes into
pub const FOLDER_ID: &str = "1TestFolder";

/// Token the mock Drive expects
pub const ACCESS_TOKEN: &str = "ya29.test-token";

/// Config rooted in `root` that talks to the mock Drive at `drive`
pub fn relay_config(root: &TempDir, drive: &MockServer) -> Config {
    let mut config = Config::default();
    config.staging.upload_dir = root.path().join("uploads");
    config.persistence.database_path = root.path().join("relay.db");
    config.publish.parent_folder_id = FOLDER_ID.to_string();
    config.publish.drive.api_base = drive.uri();
    config.publish.drive.upload_base = format!("{}/upload", drive.uri());
    config.publish.drive.access_token = Some(ACCESS_TOKEN.to_string());
    config.retry.jitter = false;
    config
}

/// Build a relay publishing to the mock Drive
pub async fn drive_relay(config: Config) -> Arc<FileRelay> {
    let store = Arc::new(DriveStore::new(&config.publish.drive));
    Arc::new(FileRelay::new(config, store).await.unwrap())
}

/// Mount `GET /{name}` on a source server
pub async fn serve_source(server: &MockServer, name: &str, status: u16, body: &str) -> String {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
    format!("{}/{name}", server.uri())
}

/// Accept uploads whose metadata names `file_name`, answering with `object_id`
pub async fn accept_upload(drive: &MockServer, file_name: &str, object_id: &str) {
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(body_string_contains(format!("\"name\":\"{file_name}\"")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": object_id })))
        .mount(drive)
        .await;
}

/// Grant every permission request
pub async fn accept_permissions(drive: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/drive/v3/files/[^/]+/permissions$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "anyoneWithLink" })))
        .mount(drive)
        .await;
}

/// Public viewer URL Drive hands out for `object_id`
pub fn share_url(object_id: &str) -> String {
    format!("https://drive.google.com/file/d/{object_id}/view?usp=sharing")
}
