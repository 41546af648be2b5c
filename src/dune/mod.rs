//! Dune execution API integration.
//!
//! Provides the [`ExecutionApi`] trait, the reqwest-backed [`DuneClient`],
//! a scripted [`MockExecutionApi`] and the status polling loop.

pub mod client;
pub mod mock;
pub mod poll;
pub mod types;

pub use client::{DuneClient, DuneClientConfig};
pub use mock::MockExecutionApi;
pub use poll::{execute_and_wait, poll_until_terminal, PollOptions};
pub use types::{
    ExecutionRequest, ExecutionResults, ExecutionState, ExecutionStatus, QueryParams,
    ResultMetadata, ResultSet, Row,
};

use async_trait::async_trait;

use crate::error::Result;

/// The three remote calls an execution goes through.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait ExecutionApi: Send + Sync {
    /// Starts an execution and returns its id.
    async fn submit_execution(&self, request: &ExecutionRequest) -> Result<String>;

    /// Fetches the current status of an execution.
    async fn execution_status(&self, execution_id: &str) -> Result<ExecutionStatus>;

    /// Fetches the results of a completed execution.
    async fn execution_results(&self, execution_id: &str) -> Result<ExecutionResults>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_client_implements_trait() {
        let api: Box<dyn ExecutionApi> = Box::new(
            MockExecutionApi::new("01HMOCK").with_states([ExecutionState::Completed]),
        );
        let id = api
            .submit_execution(&ExecutionRequest::new(5963629))
            .await
            .unwrap();
        assert_eq!(id, "01HMOCK");

        let status = api.execution_status(&id).await.unwrap();
        assert_eq!(status.state, ExecutionState::Completed);
    }
}
