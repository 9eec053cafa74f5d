//! Fixed-interval polling of an upscaler task.
//!
//! [`poll_task`] reads the task status until it succeeds, fails, or the
//! wall-clock budget in [`PollOptions::timeout`] runs out. Reads are
//! strictly sequential. Errors from the status call itself are not
//! retried; only a "still running" snapshot leads to another read.

use std::time::Duration;

use tokio::time::Instant;

use crate::api::TaskQueue;
use crate::config::{EnhanceConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
use crate::error::EnhanceError;
use crate::messages::PollOutcome;
use crate::state_codes::StateCodeTable;

/// Tunable parameters for the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between two status reads.
    pub interval: Duration,
    /// Budget measured from the first read.
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl From<&EnhanceConfig> for PollOptions {
    fn from(config: &EnhanceConfig) -> Self {
        Self {
            interval: config.poll_interval,
            timeout: config.timeout,
        }
    }
}

/// Poll `task_id` until it reaches a terminal state.
///
/// `on_progress` receives the latest percentage after every read that
/// leaves the task running. Returns the enhanced image URL on success.
///
/// Once the budget is spent the loop returns [`EnhanceError::Timeout`]
/// instead of sleeping, so no further status reads are made.
pub async fn poll_task<F>(
    queue: &dyn TaskQueue,
    task_id: &str,
    table: &StateCodeTable,
    options: &PollOptions,
    mut on_progress: F,
) -> Result<String, EnhanceError>
where
    F: FnMut(u8) + Send,
{
    let started = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let status = queue.fetch_status(task_id).await?;

        match status.classify(table) {
            PollOutcome::Succeeded { image_url } => {
                tracing::info!(task_id, attempt, "Enhancement task completed");
                return Ok(image_url);
            }
            PollOutcome::Failed { code, reason } => {
                tracing::warn!(task_id, attempt, state = code, reason = %reason, "Enhancement task failed");
                return Err(EnhanceError::RemoteTask {
                    code,
                    message: reason,
                });
            }
            PollOutcome::Continuing { progress, state } => {
                tracing::debug!(task_id, attempt, progress, state, "Enhancement task in progress");
                on_progress(progress);

                let elapsed = started.elapsed();
                if elapsed >= options.timeout {
                    tracing::warn!(
                        task_id,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Enhancement polling timed out",
                    );
                    return Err(EnhanceError::Timeout { elapsed });
                }

                tokio::time::sleep(options.interval).await;
            }
        }
    }
}
