//! Integration tests for the query runner.

use dune_export::dune::{
    ExecutionRequest, ExecutionResults, ExecutionState, MockExecutionApi, PollOptions, QueryParams,
    Row,
};
use dune_export::error::ExportError;
use dune_export::runner::{run_query, RunOptions, METADATA_FILE, RESULTS_FILE, SQL_FILE};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::tempdir;

fn fast_poll() -> PollOptions {
    PollOptions::new(Duration::from_secs(5), Duration::from_millis(1))
}

fn rows(value: Value) -> Vec<Row> {
    serde_json::from_value(value).unwrap()
}

fn price_rows() -> Vec<Row> {
    rows(json!([
        { "day": "2024-01-01", "symbol": "WLD", "price": 2.31 },
        { "day": "2024-01-02", "symbol": "WLD", "price": null },
        { "day": "2024-01-03", "symbol": "O'Brien Token", "price": 2 }
    ]))
}

#[tokio::test]
async fn test_run_writes_all_outputs() {
    let dir = tempdir().unwrap();
    let api = MockExecutionApi::new("01HRUN")
        .with_states([ExecutionState::Pending, ExecutionState::Executing, ExecutionState::Completed])
        .with_rows(price_rows());
    let options = RunOptions::new(ExecutionRequest::new(5963629))
        .with_output_dir(dir.path())
        .with_poll(fast_poll());

    let summary = run_query(&api, &options).await.unwrap();

    assert_eq!(summary.metadata.query_id, 5963629);
    assert_eq!(summary.metadata.execution_id, "01HRUN");
    assert_eq!(summary.metadata.row_count, 3);
    assert_eq!(summary.metadata.columns, vec!["day", "symbol", "price"]);
    assert_eq!(summary.preview.len(), 3);
    assert_eq!(summary.files.len(), 3);
    for name in [RESULTS_FILE, SQL_FILE, METADATA_FILE] {
        assert!(dir.path().join(name).exists(), "{name} missing");
    }
    assert_eq!(api.status_calls(), 3);
}

#[tokio::test]
async fn test_results_file_round_trips() {
    let dir = tempdir().unwrap();
    let api = MockExecutionApi::new("01HRT")
        .with_states([ExecutionState::Completed])
        .with_rows(price_rows());
    let options = RunOptions::new(ExecutionRequest::new(1))
        .with_output_dir(dir.path())
        .with_poll(fast_poll());

    run_query(&api, &options).await.unwrap();

    let saved = std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap();
    let reloaded = ExecutionResults::from_json(&saved).unwrap();
    assert_eq!(reloaded.rows().unwrap(), price_rows().as_slice());
    assert_eq!(reloaded.execution_id.as_deref(), Some("01HRT"));
    // Pretty-printed with two-space indentation.
    assert!(saved.contains("\n  \"execution_id\""));
}

#[tokio::test]
async fn test_large_integers_survive_results_file_and_sql() {
    let dir = tempdir().unwrap();
    let fetched = ExecutionResults::from_json(
        r#"{
            "execution_id": "01HBIG",
            "result": {
                "rows": [{ "day": "2024-01-01", "total_shares": 123456789012345678901234567 }],
                "metadata": { "row_count": 1, "total_result_set_bytes": 64 }
            }
        }"#,
    )
    .unwrap();
    let api = MockExecutionApi::new("01HBIG")
        .with_states([ExecutionState::Completed])
        .with_results(fetched);
    let options = RunOptions::new(ExecutionRequest::new(5963349))
        .with_output_dir(dir.path())
        .with_poll(fast_poll());

    run_query(&api, &options).await.unwrap();

    let saved = std::fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap();
    assert!(saved.contains("\"total_shares\": 123456789012345678901234567"));
    assert!(saved.contains("\"total_result_set_bytes\": 64"));
    assert!(!saved.contains("datapoint_count"));

    let sql = std::fs::read_to_string(dir.path().join(SQL_FILE)).unwrap();
    assert!(sql.contains("VALUES ('2024-01-01', 123456789012345678901234567);"));
}

#[tokio::test]
async fn test_sql_and_metadata_contents() {
    let dir = tempdir().unwrap();
    let api = MockExecutionApi::new("01HSQL")
        .with_states([ExecutionState::Completed])
        .with_rows(price_rows());
    let options = RunOptions::new(ExecutionRequest::new(42))
        .with_table("wld_price")
        .with_output_dir(dir.path())
        .with_poll(fast_poll());

    run_query(&api, &options).await.unwrap();

    let sql = std::fs::read_to_string(dir.path().join(SQL_FILE)).unwrap();
    assert!(sql.starts_with("-- SQL INSERT statements for table: wld_price\n"));
    assert!(sql.contains("-- Total rows: 3\n"));
    assert_eq!(sql.matches("INSERT INTO wld_price").count(), 3);
    assert!(sql.contains("VALUES ('2024-01-02', 'WLD', NULL);"));
    assert!(sql.contains("'O''Brien Token'"));

    let metadata: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap())
            .unwrap();
    assert_eq!(metadata["query_id"], json!(42));
    assert_eq!(metadata["execution_id"], json!("01HSQL"));
    assert_eq!(metadata["row_count"], json!(3));
    assert_eq!(metadata["columns"], json!(["day", "symbol", "price"]));
    assert!(metadata["execution_time"].is_string());
}

#[tokio::test]
async fn test_params_are_submitted() {
    let dir = tempdir().unwrap();
    let api = MockExecutionApi::new("01HP").with_states([ExecutionState::Completed]);
    let mut params = QueryParams::new();
    params.insert("days".to_string(), json!(7));
    let request = ExecutionRequest::new(9).with_params(params);
    let options = RunOptions::new(request.clone())
        .with_output_dir(dir.path())
        .with_poll(fast_poll());

    run_query(&api, &options).await.unwrap();

    assert_eq!(api.submitted(), vec![request]);
}

#[tokio::test]
async fn test_failed_execution_writes_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let api = MockExecutionApi::new("01HF")
        .with_states([ExecutionState::Pending, ExecutionState::Failed])
        .with_rows(price_rows());
    let options = RunOptions::new(ExecutionRequest::new(1))
        .with_output_dir(&out)
        .with_poll(fast_poll());

    let err = run_query(&api, &options).await.unwrap_err();

    assert!(matches!(err, ExportError::Execution(_)));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_timeout_is_execution_error() {
    let dir = tempdir().unwrap();
    let api = MockExecutionApi::new("01HT");
    let options = RunOptions::new(ExecutionRequest::new(1))
        .with_output_dir(dir.path())
        .with_poll(PollOptions::new(Duration::from_millis(30), Duration::from_millis(5)));

    let err = run_query(&api, &options).await.unwrap_err();

    assert!(matches!(err, ExportError::Execution(_)));
    assert!(!dir.path().join(RESULTS_FILE).exists());
}

#[tokio::test]
async fn test_transport_error_while_polling() {
    let dir = tempdir().unwrap();
    let api = MockExecutionApi::new("01HX").fail_status_after(2);
    let options = RunOptions::new(ExecutionRequest::new(1))
        .with_output_dir(dir.path())
        .with_poll(fast_poll());

    let err = run_query(&api, &options).await.unwrap_err();

    assert!(matches!(err, ExportError::Transport(_)));
    assert_eq!(err.category(), "Transport Error");
}

#[tokio::test]
async fn test_empty_result_writes_comment_only_sql() {
    let dir = tempdir().unwrap();
    let api = MockExecutionApi::new("01HE")
        .with_states([ExecutionState::Completed])
        .with_rows(Vec::new());
    let options = RunOptions::new(ExecutionRequest::new(1))
        .with_output_dir(dir.path())
        .with_poll(fast_poll());

    let summary = run_query(&api, &options).await.unwrap();

    assert_eq!(summary.metadata.row_count, 0);
    assert!(summary.metadata.columns.is_empty());
    let sql = std::fs::read_to_string(dir.path().join(SQL_FILE)).unwrap();
    assert_eq!(sql, "-- No rows found");
}
