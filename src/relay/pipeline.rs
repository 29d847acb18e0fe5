//! Batch submission: download, retry, publish, persist, report.

use super::FileRelay;
use crate::db::NewFileRecord;
use crate::error::{Error, Result};
use crate::retry::retry_failed;
use crate::transfer::download_batch;
use crate::types::{BatchReport, Event, PipelineStage, TransferRequest};
use crate::utils::first_pass_name;

impl FileRelay {
    /// Run a batch of URLs through the whole pipeline
    ///
    /// Every URL is downloaded concurrently; failures are retried in rounds
    /// up to `retry.max_attempts`; every staged file is published; every
    /// published file is recorded. The report lists the shareable URLs of
    /// published files and the URLs that exhausted their retries.
    ///
    /// Files that downloaded but could not be published are only logged
    /// unless `publish.report_failures` is set. Only a record store failure
    /// makes the whole call fail.
    ///
    /// The batch runs on its own task. Dropping the returned future (a
    /// disconnected HTTP client, a caller-side timeout) does not cancel it:
    /// every transfer still completes or fails and every published file is
    /// still recorded.
    pub async fn submit_batch(&self, urls: Vec<String>) -> Result<BatchReport> {
        let relay = self.clone();
        tokio::spawn(async move { relay.run_batch(urls).await })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Batch task aborted");
                Error::Other(format!("batch task aborted: {e}"))
            })?
    }

    async fn run_batch(&self, urls: Vec<String>) -> Result<BatchReport> {
        let _batch = self.batch_lock.lock().await;
        let max_concurrent = self.config.staging.max_concurrent_transfers;

        tracing::info!(total = urls.len(), "Batch accepted");
        self.emit_event(Event::BatchStarted { total: urls.len() });

        // First pass over every URL
        self.enter_stage(PipelineStage::Downloading);
        let requests = TransferRequest::batch(urls);
        let first_pass = download_batch(&self.transfer, &requests, max_concurrent, |request| {
            first_pass_name(request.index)
        })
        .await;

        for failure in &first_pass.failed {
            tracing::warn!(url = %failure.url, error = %failure.error, "Download failed");
            self.emit_event(Event::TransferFailed {
                url: failure.url.clone(),
                attempt: 0,
                error: failure.error.to_string(),
            });
        }
        tracing::info!(
            succeeded = first_pass.succeeded.len(),
            failed = first_pass.failed.len(),
            "First download pass settled"
        );

        // Runs even with nothing to retry
        self.enter_stage(PipelineStage::Retrying);
        let retried = retry_failed(
            &self.transfer,
            first_pass.failed,
            &self.config.retry,
            max_concurrent,
            &self.event_tx,
        )
        .await;

        self.enter_stage(PipelineStage::Publishing);
        let mut staged = first_pass.succeeded;
        staged.extend(retried.succeeded);
        staged.sort_by_key(|artifact| artifact.index);

        let publish = self.publisher.publish_all(staged).await;
        for published in &publish.published {
            self.emit_event(Event::Published {
                name: published.display_name.clone(),
                url: published.remote_url.clone(),
            });
        }
        for failure in &publish.failed {
            self.emit_event(Event::PublishFailed {
                url: failure.source_url.clone(),
                error: failure.error.to_string(),
            });
        }

        self.enter_stage(PipelineStage::Persisting);
        let records: Vec<NewFileRecord> = publish
            .published
            .iter()
            .map(|published| NewFileRecord {
                url: published.remote_url.clone(),
                name: published.display_name.clone(),
            })
            .collect();

        if let Err(e) = self.db.insert_files(&records).await {
            // The remote objects already exist; nothing points at them now
            for record in &records {
                tracing::error!(
                    url = %record.url,
                    name = %record.name,
                    error = %e,
                    "Published file has no stored record"
                );
            }
            return Err(e);
        }
        self.emit_event(Event::Persisted {
            count: records.len(),
        });

        let mut failed: Vec<String> = retried.failed.iter().map(ToString::to_string).collect();
        if self.config.publish.report_failures {
            failed.extend(publish.failed.iter().map(ToString::to_string));
        }

        let report = BatchReport {
            succeeded: publish
                .published
                .into_iter()
                .map(|published| published.remote_url)
                .collect(),
            failed,
        };

        self.enter_stage(PipelineStage::Done);
        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            unpublished = publish.failed.len(),
            "Batch finished"
        );
        self.emit_event(Event::BatchFinished {
            succeeded: report.succeeded.len(),
            failed: report.failed.len(),
        });

        Ok(report)
    }

    fn enter_stage(&self, stage: PipelineStage) {
        tracing::info!(stage = %stage, "Pipeline stage");
        self.emit_event(Event::StageChanged { stage });
    }
}
