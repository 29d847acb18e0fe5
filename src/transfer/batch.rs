//! Settle-all batch downloads
//!
//! Every request in a batch is started before any result is inspected, and
//! one failure never cancels its siblings. Results come back in input order.

use super::TransferUnit;
use crate::types::{BatchResult, FailedTransfer, StagedArtifact, TransferOutcome, TransferRequest};
use futures::future::join_all;
use futures::stream::{self, StreamExt};

/// Download every request and partition the outcomes
///
/// `name_for` picks the staging file name of each request. With
/// `max_concurrent` set, at most that many transfers are in flight at once;
/// otherwise all of them start together.
pub async fn download_batch<F>(
    unit: &TransferUnit,
    requests: &[TransferRequest],
    max_concurrent: Option<usize>,
    name_for: F,
) -> BatchResult
where
    F: Fn(&TransferRequest) -> String,
{
    if requests.is_empty() {
        return BatchResult::default();
    }

    // Collected eagerly so the batch future holds no borrowing closures
    let transfers: Vec<_> = requests
        .iter()
        .map(|request| fetch_one(unit, request, name_for(request)))
        .collect();

    let settled: Vec<_> = match max_concurrent {
        Some(limit) => stream::iter(transfers).buffered(limit.max(1)).collect().await,
        None => join_all(transfers).await,
    };

    let mut result = BatchResult::default();
    for (request, outcome) in settled {
        match outcome {
            TransferOutcome::Success { local_path } => result.succeeded.push(StagedArtifact {
                index: request.index,
                url: request.url.clone(),
                local_path,
            }),
            TransferOutcome::Failure { url, cause } => {
                tracing::debug!(url = %url, error = %cause, "Transfer failed");
                result.failed.push(FailedTransfer {
                    index: request.index,
                    url,
                    error: cause,
                });
            }
        }
    }

    tracing::debug!(
        total = requests.len(),
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        "Batch pass settled"
    );

    result
}

async fn fetch_one<'a>(
    unit: &TransferUnit,
    request: &'a TransferRequest,
    name: String,
) -> (&'a TransferRequest, TransferOutcome) {
    let outcome = TransferOutcome::from(unit.fetch(&request.url, &name).await);
    (request, outcome)
}
