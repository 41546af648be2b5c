//! Mock execution API for testing.
//!
//! Replays a scripted sequence of states and returns canned results.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::dune::types::{
    ExecutionRequest, ExecutionResults, ExecutionState, ExecutionStatus, ResultSet, Row,
};
use crate::dune::ExecutionApi;
use crate::error::{ExportError, Result};

/// Mock API that hands out one scripted state per status call.
///
/// Once the script is exhausted the last state repeats. Used for unit and
/// integration testing without real API calls.
#[derive(Debug, Default)]
pub struct MockExecutionApi {
    execution_id: String,
    states: Mutex<VecDeque<ExecutionState>>,
    last_state: Mutex<ExecutionState>,
    results: ExecutionResults,
    fail_status_after: Option<usize>,
    submitted: Mutex<Vec<ExecutionRequest>>,
    status_calls: AtomicUsize,
}

impl MockExecutionApi {
    /// Creates a mock that reports `QUERY_STATE_PENDING` forever.
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            last_state: Mutex::new(ExecutionState::Pending),
            ..Default::default()
        }
    }

    /// Sets the sequence of states returned by successive status calls.
    pub fn with_states(mut self, states: impl IntoIterator<Item = ExecutionState>) -> Self {
        self.states = Mutex::new(states.into_iter().collect());
        self
    }

    /// Sets the rows returned by the results call.
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.results = ExecutionResults {
            execution_id: Some(self.execution_id.clone()),
            state: Some(ExecutionState::Completed),
            is_execution_finished: Some(true),
            ..ExecutionResults::from_result_set(ResultSet::from_rows(rows))
        };
        self
    }

    /// Sets the full results envelope returned by the results call.
    pub fn with_results(mut self, results: ExecutionResults) -> Self {
        self.results = results;
        self
    }

    /// Makes every status call after the first `n` fail with a transport error.
    pub fn fail_status_after(mut self, n: usize) -> Self {
        self.fail_status_after = Some(n);
        self
    }

    /// Requests received by `submit_execution`.
    pub fn submitted(&self) -> Vec<ExecutionRequest> {
        self.submitted
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Number of status calls made so far.
    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    fn next_state(&self) -> ExecutionState {
        let mut last = self.last_state.lock().unwrap_or_else(|e| e.into_inner());
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = states.pop_front() {
            *last = state;
        }
        last.clone()
    }
}

#[async_trait]
impl ExecutionApi for MockExecutionApi {
    async fn submit_execution(&self, request: &ExecutionRequest) -> Result<String> {
        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Ok(self.execution_id.clone())
    }

    async fn execution_status(&self, execution_id: &str) -> Result<ExecutionStatus> {
        let calls = self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status_after.is_some_and(|n| calls >= n) {
            return Err(ExportError::transport("mock: status endpoint unavailable"));
        }
        Ok(ExecutionStatus::with_state(execution_id, self.next_state()))
    }

    async fn execution_results(&self, _execution_id: &str) -> Result<ExecutionResults> {
        Ok(self.results.clone())
    }
}
