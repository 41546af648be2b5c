//! Query runner pipeline.
//!
//! Submits one query, waits for it, fetches the results and writes the
//! results JSON, a flat INSERT script and an execution metadata summary.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::dune::{poll_until_terminal, ExecutionApi, ExecutionRequest, ExecutionResults, PollOptions};
use crate::error::{ExportError, Result};
use crate::output::{generation_timestamp, write_file};
use crate::sql::render_flat_inserts;

pub const RESULTS_FILE: &str = "Result.json";
pub const SQL_FILE: &str = "insert_statements.sql";
pub const METADATA_FILE: &str = "execution_metadata.json";

/// Table name used in the flat INSERT script when none is given.
pub const DEFAULT_TABLE: &str = "price_data";

/// Rows shown in the preview.
const PREVIEW_ROWS: usize = 3;

/// Characters per preview line.
const PREVIEW_WIDTH: usize = 100;

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub request: ExecutionRequest,
    /// Table name for the flat INSERT script.
    pub table: String,
    pub output_dir: PathBuf,
    pub poll: PollOptions,
}

impl RunOptions {
    pub fn new(request: ExecutionRequest) -> Self {
        Self {
            request,
            table: DEFAULT_TABLE.to_string(),
            output_dir: PathBuf::from("."),
            poll: PollOptions::default(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_poll(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }
}

/// Contents of `execution_metadata.json`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExecutionMetadata {
    pub query_id: u64,
    pub execution_id: String,
    pub execution_time: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub metadata: ExecutionMetadata,
    /// First rows as compact JSON, truncated for display.
    pub preview: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Compact JSON of the first rows, each cut to [`PREVIEW_WIDTH`] characters.
pub fn preview_rows(results: &ExecutionResults) -> Vec<String> {
    let Some(result) = &results.result else {
        return Vec::new();
    };

    result
        .rows
        .iter()
        .take(PREVIEW_ROWS)
        .map(|row| {
            let json = serde_json::to_string(row).unwrap_or_default();
            if json.chars().count() > PREVIEW_WIDTH {
                format!("{}...", json.chars().take(PREVIEW_WIDTH).collect::<String>())
            } else {
                json
            }
        })
        .collect()
}

/// Runs the whole pipeline.
///
/// Every output is rendered before the first file is written, so a failure
/// leaves no partial set of output files behind.
pub async fn run_query(api: &dyn ExecutionApi, options: &RunOptions) -> Result<RunSummary> {
    let query_id = options.request.query_id;

    info!(query_id, "Submitting query");
    let execution_id = api.submit_execution(&options.request).await?;

    info!(execution_id = %execution_id, "Waiting for execution");
    if !poll_until_terminal(api, &execution_id, options.poll).await? {
        return Err(ExportError::execution(format!(
            "Execution {execution_id} of query {query_id} did not complete"
        )));
    }

    info!(execution_id = %execution_id, "Fetching results");
    let results = api.execution_results(&execution_id).await?;

    let generated_at = generation_timestamp();
    let metadata = ExecutionMetadata {
        query_id,
        execution_id,
        execution_time: generated_at.clone(),
        row_count: results.row_count(),
        columns: results.columns(),
    };

    let results_json = results.to_json_pretty()?;
    let sql = render_flat_inserts(&results, &options.table, &generated_at);
    let metadata_json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| ExportError::data_shape(format!("Failed to serialize metadata: {e}")))?;

    let files = write_outputs(
        &options.output_dir,
        [
            (RESULTS_FILE, results_json),
            (SQL_FILE, sql),
            (METADATA_FILE, metadata_json),
        ],
    )?;

    info!(
        rows = metadata.row_count,
        columns = metadata.columns.len(),
        "Query run complete"
    );

    Ok(RunSummary {
        preview: preview_rows(&results),
        metadata,
        files,
    })
}

fn write_outputs<const N: usize>(dir: &Path, outputs: [(&str, String); N]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;

    outputs
        .into_iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            write_file(&path, &content)?;
            Ok(path)
        })
        .collect()
}
