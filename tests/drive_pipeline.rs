//! End-to-end batches against a mock Google Drive
//!
//! Source files and the Drive API are both served by wiremock; everything
//! in between (staging, retries, publishing, the record store) is real.

mod common;

use common::{
    FOLDER_ID, accept_permissions, accept_upload, drive_relay, relay_config, serve_source,
    share_url,
};
use file_relay::{Event, PipelineStage};
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn names_in(dir: std::path::PathBuf) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn staged_names(root: &TempDir) -> Vec<String> {
    names_in(root.path().join("uploads"))
}

/// Unpublished files set aside under `uploads/failed`
fn set_aside_names(root: &TempDir) -> Vec<String> {
    names_in(root.path().join("uploads").join(file_relay::publish::FAILED_DIR))
}

#[tokio::test]
async fn mixed_batch_is_published_recorded_and_reported() {
    let sources = MockServer::start().await;
    let drive = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let good = serve_source(&sources, "good.pdf", 200, "%PDF good").await;
    let dead = serve_source(&sources, "dead.bin", 500, "").await;

    // First 503, then fine: recovered by the first retry round
    Mock::given(method("GET"))
        .and(path("/flaky.txt"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&sources)
        .await;
    let flaky = serve_source(&sources, "flaky.txt", 200, "eventually").await;

    accept_upload(&drive, "file_0", "drive-good").await;
    accept_upload(&drive, "retry_2_flaky.txt_attempt_1", "drive-flaky").await;
    accept_permissions(&drive).await;

    let config = relay_config(&root, &drive);
    let max_attempts = config.retry.max_attempts;
    let relay = drive_relay(config).await;

    let report = relay
        .submit_batch(vec![good, dead.clone(), flaky])
        .await
        .unwrap();

    assert_eq!(
        report.succeeded,
        vec![share_url("drive-good"), share_url("drive-flaky")]
    );
    assert_eq!(
        report.failed,
        vec![format!("{dead} (failed after {max_attempts} attempts)")]
    );

    let records = relay.list_files().await.unwrap();
    let mut recorded: Vec<(String, String)> = records
        .iter()
        .map(|r| (r.name.clone(), r.url.clone()))
        .collect();
    recorded.sort();
    assert_eq!(
        recorded,
        vec![
            ("file_0".to_string(), share_url("drive-good")),
            (
                "retry_2_flaky.txt_attempt_1".to_string(),
                share_url("drive-flaky")
            ),
        ]
    );

    // Published files leave staging
    assert!(staged_names(&root).is_empty());
}

#[tokio::test]
async fn uploads_carry_token_folder_and_content() {
    let sources = MockServer::start().await;
    let drive = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let url = serve_source(&sources, "notes.txt", 200, "meeting notes").await;

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(header("authorization", "Bearer ya29.test-token"))
        .and(body_string_contains(FOLDER_ID))
        .and(body_string_contains("meeting notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "n1" })))
        .expect(1)
        .mount(&drive)
        .await;
    Mock::given(method("POST"))
        .and(path("/drive/v3/files/n1/permissions"))
        .and(body_json(serde_json::json!({ "role": "reader", "type": "anyone" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "p" })))
        .expect(1)
        .mount(&drive)
        .await;

    let relay = drive_relay(relay_config(&root, &drive)).await;
    let report = relay.submit_batch(vec![url]).await.unwrap();

    assert_eq!(report.succeeded, vec![share_url("n1")]);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn rejected_upload_is_dropped_from_report_and_file_kept() {
    let sources = MockServer::start().await;
    let drive = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let kept = serve_source(&sources, "kept.csv", 200, "a,b").await;
    let refused = serve_source(&sources, "refused.csv", 200, "c,d").await;

    accept_upload(&drive, "file_0", "ok-1").await;
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(body_string_contains("\"name\":\"file_1\""))
        .respond_with(ResponseTemplate::new(403).set_body_string("storageQuotaExceeded"))
        .mount(&drive)
        .await;
    accept_permissions(&drive).await;

    let relay = drive_relay(relay_config(&root, &drive)).await;
    let report = relay.submit_batch(vec![kept, refused]).await.unwrap();

    assert_eq!(report.succeeded, vec![share_url("ok-1")]);
    assert!(
        report.failed.is_empty(),
        "publish failures are not reported by default"
    );
    assert_eq!(relay.list_files().await.unwrap().len(), 1);
    assert_eq!(staged_names(&root), vec!["failed"]);
    let kept = set_aside_names(&root);
    assert_eq!(kept.len(), 1);
    assert!(kept[0].starts_with("file_1_"), "unexpected name {}", kept[0]);
}

#[tokio::test]
async fn rejected_upload_is_reported_when_enabled() {
    let sources = MockServer::start().await;
    let drive = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let refused = serve_source(&sources, "refused.csv", 200, "c,d").await;
    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&drive)
        .await;

    let mut config = relay_config(&root, &drive);
    config.publish.report_failures = true;
    let relay = drive_relay(config).await;

    let report = relay.submit_batch(vec![refused.clone()]).await.unwrap();

    assert!(report.succeeded.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert!(
        report.failed[0].starts_with(&format!("{refused} (publish failed:")),
        "unexpected annotation {}",
        report.failed[0]
    );
}

#[tokio::test]
async fn permission_failure_is_not_published() {
    let sources = MockServer::start().await;
    let drive = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let url = serve_source(&sources, "private.doc", 200, "secret").await;
    accept_upload(&drive, "file_0", "priv-1").await;
    Mock::given(method("POST"))
        .and(path("/drive/v3/files/priv-1/permissions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&drive)
        .await;

    let relay = drive_relay(relay_config(&root, &drive)).await;
    let report = relay.submit_batch(vec![url]).await.unwrap();

    assert!(report.succeeded.is_empty());
    assert!(relay.list_files().await.unwrap().is_empty());
    let kept = set_aside_names(&root);
    assert_eq!(kept.len(), 1);
    assert!(kept[0].starts_with("file_0_"), "unexpected name {}", kept[0]);
}

#[tokio::test]
async fn events_follow_pipeline_order() {
    let sources = MockServer::start().await;
    let drive = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let url = serve_source(&sources, "one.txt", 200, "1").await;
    accept_upload(&drive, "file_0", "e1").await;
    accept_permissions(&drive).await;

    let relay = drive_relay(relay_config(&root, &drive)).await;
    let mut events = relay.subscribe();

    relay.submit_batch(vec![url]).await.unwrap();

    let mut stages = Vec::new();
    let mut published = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::StageChanged { stage } => stages.push(stage),
            Event::Published { .. } => published += 1,
            _ => {}
        }
    }

    assert_eq!(
        stages,
        vec![
            PipelineStage::Downloading,
            PipelineStage::Retrying,
            PipelineStage::Publishing,
            PipelineStage::Persisting,
            PipelineStage::Done,
        ]
    );
    assert_eq!(published, 1);
}

#[tokio::test]
async fn records_survive_a_restart() {
    let sources = MockServer::start().await;
    let drive = MockServer::start().await;
    let root = TempDir::new().unwrap();

    let url = serve_source(&sources, "keep.txt", 200, "keep").await;
    accept_upload(&drive, "file_0", "k1").await;
    accept_permissions(&drive).await;

    let relay = drive_relay(relay_config(&root, &drive)).await;
    relay.submit_batch(vec![url]).await.unwrap();
    drop(relay);

    let reopened = drive_relay(relay_config(&root, &drive)).await;
    let records = reopened.list_files().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].url, share_url("k1"));
    assert_eq!(records[0].name, "file_0");
}
