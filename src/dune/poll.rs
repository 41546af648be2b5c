//! Fixed-interval status polling.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::dune::types::{ExecutionRequest, ExecutionResults, ExecutionState};
use crate::dune::ExecutionApi;
use crate::error::Result;

/// Default overall polling timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default interval between status calls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Bounds for the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Give up once this much time has elapsed.
    pub timeout: Duration,
    /// Sleep between status calls.
    pub interval: Duration,
}

impl PollOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn from_secs(timeout_secs: u64, interval_secs: u64) -> Self {
        Self::new(
            Duration::from_secs(timeout_secs),
            Duration::from_secs(interval_secs),
        )
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from_secs(DEFAULT_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS)
    }
}

/// Polls the status endpoint until the execution reaches a terminal state.
///
/// Returns `Ok(true)` when `QUERY_STATE_COMPLETED` is observed, `Ok(false)`
/// on failed/cancelled or when the timeout elapses first. Unrecognized states
/// keep the loop going. Transport errors from the status call propagate.
pub async fn poll_until_terminal(
    api: &dyn ExecutionApi,
    execution_id: &str,
    options: PollOptions,
) -> Result<bool> {
    let start = Instant::now();

    while start.elapsed() < options.timeout {
        let status = api.execution_status(execution_id).await?;

        debug!(
            execution_id = %execution_id,
            state = %status.state,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Polling execution status"
        );

        if status.state.is_terminal() {
            if status.state == ExecutionState::Completed {
                info!(execution_id = %execution_id, "Query execution completed");
                return Ok(true);
            }
            error!(execution_id = %execution_id, state = %status.state, "Query execution failed");
            return Ok(false);
        }

        tokio::time::sleep(options.interval).await;
    }

    warn!(
        execution_id = %execution_id,
        timeout_secs = options.timeout.as_secs(),
        "Timed out waiting for query execution"
    );
    Ok(false)
}

/// Submits a query, waits for it and fetches the results.
///
/// Returns `None` when polling ends without completion.
pub async fn execute_and_wait(
    api: &dyn ExecutionApi,
    request: &ExecutionRequest,
    options: PollOptions,
) -> Result<Option<(String, ExecutionResults)>> {
    let execution_id = api.submit_execution(request).await?;

    if !poll_until_terminal(api, &execution_id, options).await? {
        return Ok(None);
    }

    let results = api.execution_results(&execution_id).await?;
    Ok(Some((execution_id, results)))
}
