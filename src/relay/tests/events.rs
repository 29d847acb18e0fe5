use super::*;

fn stages(events: &[Event]) -> Vec<PipelineStage> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::StageChanged { stage } => Some(*stage),
            _ => None,
        })
        .collect()
}

const ALL_STAGES: [PipelineStage; 5] = [
    PipelineStage::Downloading,
    PipelineStage::Retrying,
    PipelineStage::Publishing,
    PipelineStage::Persisting,
    PipelineStage::Done,
];

#[tokio::test]
async fn stages_are_emitted_in_order() {
    let server = MockServer::start().await;
    let url = serve(&server, "a", 200).await;
    let (relay, _store, _temp_dir) = create_test_relay().await;
    let mut rx = relay.subscribe();

    relay.submit_batch(vec![url]).await.unwrap();

    let events = drain_events(&mut rx);
    assert_eq!(stages(&events), ALL_STAGES.to_vec());
    assert!(matches!(events.first(), Some(Event::BatchStarted { total: 1 })));
    assert!(matches!(
        events.last(),
        Some(Event::BatchFinished {
            succeeded: 1,
            failed: 0
        })
    ));
}

#[tokio::test]
async fn empty_batch_still_passes_through_every_stage() {
    let (relay, _store, _temp_dir) = create_test_relay().await;
    let mut rx = relay.subscribe();

    relay.submit_batch(Vec::new()).await.unwrap();

    let events = drain_events(&mut rx);
    assert_eq!(stages(&events), ALL_STAGES.to_vec());
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, Event::RetryRound { .. })),
        "no retry round without failures"
    );
    assert!(events.iter().any(|e| matches!(e, Event::Persisted { count: 0 })));
}

#[tokio::test]
async fn failures_and_retry_rounds_are_announced() {
    let server = MockServer::start().await;
    let bad = serve(&server, "bad", 500).await;
    let (relay, _store, _temp_dir) = create_test_relay().await;
    let mut rx = relay.subscribe();

    relay.submit_batch(vec![bad.clone()]).await.unwrap();

    let events = drain_events(&mut rx);
    let attempts: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            Event::TransferFailed { url, attempt, .. } if *url == bad => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(attempts, vec![0, 1, 2, 3]);

    let rounds = events
        .iter()
        .filter(|e| matches!(e, Event::RetryRound { .. }))
        .count();
    assert_eq!(rounds, 3);
}

#[tokio::test]
async fn published_files_are_announced() {
    let server = MockServer::start().await;
    let url = serve(&server, "doc.pdf", 200).await;
    let (relay, _store, _temp_dir) = create_test_relay().await;
    let mut rx = relay.subscribe();

    let report = relay.submit_batch(vec![url]).await.unwrap();

    let published: Vec<(String, String)> = drain_events(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            Event::Published { name, url } => Some((name, url)),
            _ => None,
        })
        .collect();
    assert_eq!(published, vec![("file_0".to_string(), report.succeeded[0].clone())]);
}
