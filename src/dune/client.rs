//! Dune API client implementation.
//!
//! Implements the ExecutionApi trait against the Dune REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{DuneSettings, DEFAULT_BASE_URL};
use crate::dune::types::{ExecutionRequest, ExecutionResponse, ExecutionResults, ExecutionStatus};
use crate::dune::ExecutionApi;
use crate::error::{ExportError, Result};

/// Default timeout for a single API request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-dune-api-key";

/// Dune client configuration.
#[derive(Debug, Clone)]
pub struct DuneClientConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL of the API, without trailing slash.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl DuneClientConfig {
    /// Creates a new config with the given API key and the public base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Builds a config from file settings plus the API key.
    pub fn from_settings(api_key: impl Into<String>, settings: &DuneSettings) -> Self {
        Self::new(api_key)
            .with_url(settings.base_url.clone())
            .with_timeout(settings.request_timeout_secs)
    }
}

/// Dune API client.
#[derive(Debug, Clone)]
pub struct DuneClient {
    config: DuneClientConfig,
    client: Client,
}

impl DuneClient {
    /// Creates a new Dune client with the given configuration.
    pub fn new(config: DuneClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ExportError::config("DUNE_API_KEY is required"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExportError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Creates a client from environment variables and file settings.
    ///
    /// Reads `DUNE_API_KEY` for the API key.
    pub fn from_env(settings: &DuneSettings) -> Result<Self> {
        let api_key = std::env::var("DUNE_API_KEY").map_err(|_| {
            ExportError::config("DUNE_API_KEY is not set. Add DUNE_API_KEY=<key> to your .env file")
        })?;

        Self::new(DuneClientConfig::from_settings(api_key, settings))
    }

    /// Returns the execute endpoint URL for a query.
    fn execute_url(&self, query_id: u64) -> String {
        format!("{}/query/{}/execute", self.config.base_url, query_id)
    }

    /// Returns the status endpoint URL for an execution.
    fn status_url(&self, execution_id: &str) -> String {
        format!("{}/execution/{}/status", self.config.base_url, execution_id)
    }

    /// Returns the results endpoint URL for an execution.
    fn results_url(&self, execution_id: &str) -> String {
        format!("{}/execution/{}/results", self.config.base_url, execution_id)
    }

    /// Parses an API error response.
    fn parse_error(status: StatusCode, body: &str) -> ExportError {
        if status == StatusCode::UNAUTHORIZED {
            return ExportError::transport("Authentication failed. Check your DUNE_API_KEY.");
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return ExportError::transport("Rate limited by Dune. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<DuneErrorResponse>(body) {
            return ExportError::transport(format!(
                "Dune API error ({}): {}",
                status, error_response.error
            ));
        }

        ExportError::transport(format!("Dune API error ({}): {}", status, body))
    }

    /// Sends a request with the API key and decodes the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExportError::transport(format!("{what}: request timed out"))
                } else if e.is_connect() {
                    ExportError::transport(format!(
                        "{what}: failed to connect to Dune API. Check your network."
                    ))
                } else {
                    ExportError::transport(format!("{what}: request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExportError::transport(format!("{what}: failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ExportError::data_shape(format!("{what}: failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ExecutionApi for DuneClient {
    async fn submit_execution(&self, request: &ExecutionRequest) -> Result<String> {
        let url = self.execute_url(request.query_id);
        debug!(url = %url, "Submitting execution");

        let response: ExecutionResponse = self
            .send_json(self.client.post(&url).json(&request.body()), "execute")
            .await?;

        let execution_id = response.execution_id.ok_or_else(|| {
            ExportError::data_shape("execute: response has no 'execution_id'")
        })?;

        info!(
            query_id = request.query_id,
            execution_id = %execution_id,
            state = %response.state,
            "Query execution started"
        );
        Ok(execution_id)
    }

    async fn execution_status(&self, execution_id: &str) -> Result<ExecutionStatus> {
        self.send_json(self.client.get(self.status_url(execution_id)), "status")
            .await
    }

    async fn execution_results(&self, execution_id: &str) -> Result<ExecutionResults> {
        let results: ExecutionResults = self
            .send_json(self.client.get(self.results_url(execution_id)), "results")
            .await?;

        debug!(
            execution_id = %execution_id,
            rows = results.row_count(),
            "Fetched execution results"
        );
        Ok(results)
    }
}

/// Dune error body.
#[derive(Debug, Deserialize)]
struct DuneErrorResponse {
    error: String,
}
