//! Retry rounds for failed transfers
//!
//! URLs that fail the first download pass are re-attempted in sequential
//! rounds. Each round is itself a settle-all batch over the URLs still
//! failing, so one round never waits on a single URL's private schedule.
//! A URL that is still failing after the last round is reported as exhausted.
//!
//! Rounds are separated by an exponential backoff delay with optional jitter.
//! The default initial delay is zero, which runs rounds back to back.
//!
//! # Example
//!
//! ```no_run
//! use file_relay::config::RetryConfig;
//! use file_relay::retry::retry_failed;
//! use file_relay::transfer::TransferUnit;
//!
//! # async fn example(failures: Vec<file_relay::types::FailedTransfer>) {
//! let unit = TransferUnit::new(reqwest::Client::new(), "./uploads");
//! let (events, _rx) = tokio::sync::broadcast::channel(64);
//!
//! let outcome = retry_failed(&unit, failures, &RetryConfig::default(), None, &events).await;
//! for exhausted in &outcome.failed {
//!     println!("{exhausted}");
//! }
//! # }
//! ```

use crate::config::RetryConfig;
use crate::transfer::{TransferUnit, download_batch};
use crate::types::{Event, ExhaustedUrl, FailedTransfer, StagedArtifact};
use crate::utils::retry_name;
use rand::Rng;
use std::time::Duration;
use tokio::sync::broadcast;

/// Outcome of all retry rounds
#[derive(Clone, Debug, Default)]
pub struct RetryResult {
    /// Files recovered by some retry round, in the order they were recovered
    pub succeeded: Vec<StagedArtifact>,
    /// URLs that failed every round, in batch order
    pub failed: Vec<ExhaustedUrl>,
}

/// Re-attempt `failures` for up to `config.max_attempts` rounds
///
/// Round `n` downloads every still-failing URL under the staging name
/// `retry_{index}_{basename}_attempt_{n}`. Rounds stop early once nothing is
/// left to retry. With an empty input no round runs and no event is emitted.
pub async fn retry_failed(
    unit: &TransferUnit,
    failures: Vec<FailedTransfer>,
    config: &RetryConfig,
    max_concurrent: Option<usize>,
    events: &broadcast::Sender<Event>,
) -> RetryResult {
    let mut pending = failures;
    let mut recovered = Vec::new();
    let mut delay = config.initial_delay;
    let mut attempt = 0;

    while attempt < config.max_attempts && !pending.is_empty() {
        attempt += 1;

        if !delay.is_zero() {
            let wait = if config.jitter { add_jitter(delay) } else { delay };
            tracing::debug!(attempt, delay_ms = wait.as_millis(), "Waiting before retry round");
            tokio::time::sleep(wait).await;

            delay = next_delay(delay, config);
        }

        tracing::info!(
            attempt,
            max_attempts = config.max_attempts,
            pending = pending.len(),
            "Starting retry round"
        );
        events
            .send(Event::RetryRound {
                attempt,
                pending: pending.len(),
            })
            .ok();

        let requests: Vec<_> = pending.iter().map(FailedTransfer::request).collect();
        let round = download_batch(unit, &requests, max_concurrent, |request| {
            retry_name(request.index, &request.url, attempt)
        })
        .await;

        for failure in &round.failed {
            tracing::warn!(
                url = %failure.url,
                attempt,
                error = %failure.error,
                "Retry attempt failed"
            );
            events
                .send(Event::TransferFailed {
                    url: failure.url.clone(),
                    attempt,
                    error: failure.error.to_string(),
                })
                .ok();
        }

        if !round.succeeded.is_empty() {
            tracing::info!(
                attempt,
                recovered = round.succeeded.len(),
                "Retry round recovered downloads"
            );
        }

        recovered.extend(round.succeeded);
        pending = round.failed;
    }

    let failed: Vec<ExhaustedUrl> = pending
        .into_iter()
        .map(|failure| ExhaustedUrl {
            index: failure.index,
            url: failure.url,
            attempts: attempt,
            last_error: failure.error,
        })
        .collect();

    for exhausted in &failed {
        tracing::error!(
            url = %exhausted.url,
            attempts = exhausted.attempts,
            error = %exhausted.last_error,
            "Download failed after all retry rounds"
        );
    }

    RetryResult {
        succeeded: recovered,
        failed,
    }
}

/// Grow `delay` by the backoff multiplier, capped at `max_delay`
///
/// A product too large for a [`Duration`] saturates to the cap.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
        .map_or(config.max_delay, |next| next.min(config.max_delay))
}

/// Add random jitter to a delay
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
