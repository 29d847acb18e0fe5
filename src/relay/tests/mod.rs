use super::test_helpers::{create_test_relay, create_test_relay_with, drain_events};
use super::*;
use crate::publish::MemoryStore;
use crate::types::{Event, PipelineStage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod events;

/// Mount `GET /{name}` answering with `status` and a small body
async fn serve(server: &MockServer, name: &str, status: u16) -> String {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(status).set_body_string(format!("content of {name}")))
        .mount(server)
        .await;
    format!("{}/{name}", server.uri())
}

fn staged_files(relay: &FileRelay) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(relay.transfer.upload_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Files set aside after failing to publish, with their unique suffix removed
fn set_aside_files(relay: &FileRelay) -> Vec<String> {
    let dir = relay
        .transfer
        .upload_dir()
        .join(crate::publish::FAILED_DIR);
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| {
            let name = entry.unwrap().file_name().to_string_lossy().into_owned();
            // Drop the trailing `_{uuid}`
            name.rsplit_once('_').unwrap().0.to_string()
        })
        .collect();
    names.sort();
    names
}
