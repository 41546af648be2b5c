//! Integration tests for the migration generator.

use dune_export::error::ExportError;
use dune_export::migration::{generate_migration, README_FILE, SCHEMA_FILE, STEPS};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::tempdir;

fn write_result(dir: &Path, name: &str, rows: Value) {
    let doc = json!({
        "execution_id": "01HMIG",
        "query_id": 1,
        "state": "QUERY_STATE_COMPLETED",
        "result": { "rows": rows }
    });
    std::fs::write(dir.join(name), serde_json::to_string_pretty(&doc).unwrap()).unwrap();
}

fn write_all_results(dir: &Path) {
    write_result(
        dir,
        "Result_Collateral.json",
        json!([
            { "day": "2024-01-01 00:00:00.000 UTC", "collateral_token": "0x1", "collateral_symbol": "WLD",
              "collateral_amount": 100.5, "collateral_amount_usd": 230.1 },
            { "day": "2024-01-01 00:00:00.000 UTC", "collateral_token": "0x2", "collateral_symbol": "WETH",
              "collateral_amount": 2 }
        ]),
    );
    write_result(
        dir,
        "Result_Borrow.json",
        json!([
            { "day": "2024-01-01", "loan_token": "0xa", "loan_symbol": "USDC", "borrow_amount": 1, "borrow_amount_usd": 1 },
            { "day": "2024-01-02", "loan_token": "0xa", "loan_symbol": "USDC", "borrow_amount": 2, "borrow_amount_usd": 2 },
            { "day": "2024-01-03", "loan_token": "0xa", "loan_symbol": "USDC", "borrow_amount": 3, "borrow_amount_usd": 3 }
        ]),
    );
    write_result(
        dir,
        "Result_DEX.json",
        json!([
            { "date": "2024-01-01", "blockchain": "worldchain", "chain_volume_wld": 1.5,
              "chain_volume_usd": 3.0, "chain_num_swaps": 10, "total_volume_wld": 2.5,
              "total_volume_usd": 5.0, "total_num_swaps": 12 }
        ]),
    );
    write_result(dir, "Result_Earn.json", json!([]));
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_generates_six_files() {
    let results = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_all_results(results.path());

    let files = generate_migration(results.path(), out.path(), "2024-06-01T00:00:00").unwrap();

    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "01_create_schema.sql",
            "02_insert_collateral.sql",
            "03_insert_borrow.sql",
            "04_insert_dex.sql",
            "05_insert_earn.sql",
            "README.md",
        ]
    );
    for file in &files {
        assert!(file.exists());
    }
}

#[test]
fn test_generated_scripts_content() {
    let results = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_all_results(results.path());

    generate_migration(results.path(), out.path(), "2024-06-01T00:00:00").unwrap();

    let schema = read(&out.path().join(SCHEMA_FILE));
    assert!(schema.contains("-- Generated at: 2024-06-01T00:00:00"));
    assert!(schema.contains("CREATE TABLE IF NOT EXISTS morpho_earn_history ("));

    let collateral = read(&out.path().join(STEPS[0].output));
    assert!(collateral.contains("-- Total rows: 2"));
    assert!(collateral.contains("('2024-01-01 00:00:00.000 UTC', '0x2', 'WETH', 2, NULL)"));

    let borrow = read(&out.path().join(STEPS[1].output));
    let first = borrow.find("'2024-01-01'").unwrap();
    let second = borrow.find("'2024-01-02'").unwrap();
    let third = borrow.find("'2024-01-03'").unwrap();
    assert!(first < second && second < third);
    assert_eq!(borrow.matches("INSERT INTO").count(), 1);

    let dex = read(&out.path().join(STEPS[2].output));
    assert!(dex.contains("ON CONFLICT (date, blockchain)"));

    let earn = read(&out.path().join(STEPS[3].output));
    assert!(earn.contains("-- Total rows: 0"));
    assert!(!earn.contains("INSERT INTO"));

    let readme = read(&out.path().join(README_FILE));
    assert!(readme.starts_with("# Initial data migration"));
}

#[test]
fn test_missing_required_field_aborts_before_writing() {
    let results = tempdir().unwrap();
    let out = tempdir().unwrap();
    let target = out.path().join("migration_sql");
    write_all_results(results.path());
    write_result(
        results.path(),
        "Result_DEX.json",
        json!([{ "date": "2024-01-01", "blockchain": "worldchain" }]),
    );

    let err = generate_migration(results.path(), &target, "now").unwrap_err();

    assert!(matches!(err, ExportError::DataShape(_)));
    assert!(err.to_string().contains("dex_volume_history"));
    assert!(!target.exists());
}

#[test]
fn test_missing_result_rows_is_data_shape_error() {
    let results = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_all_results(results.path());
    std::fs::write(
        results.path().join("Result_Borrow.json"),
        r#"{ "execution_id": "x", "error": "expired" }"#,
    )
    .unwrap();

    let err = generate_migration(results.path(), out.path(), "now").unwrap_err();

    assert!(matches!(err, ExportError::DataShape(_)));
    assert!(err.to_string().contains("Result_Borrow.json"));
}

#[test]
fn test_missing_input_file_is_io_error() {
    let results = tempdir().unwrap();
    let out = tempdir().unwrap();

    let err = generate_migration(results.path(), out.path(), "now").unwrap_err();

    assert!(matches!(err, ExportError::Io(_)));
    assert!(err.to_string().contains("Result_Collateral.json"));
}

#[test]
fn test_invalid_json_is_data_shape_error() {
    let results = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_all_results(results.path());
    std::fs::write(results.path().join("Result_Earn.json"), "{ \"result\": ").unwrap();

    let err = generate_migration(results.path(), out.path(), "now").unwrap_err();

    assert!(matches!(err, ExportError::DataShape(_)));
}

#[test]
fn test_rerun_overwrites_files() {
    let results = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_all_results(results.path());

    generate_migration(results.path(), out.path(), "first").unwrap();
    generate_migration(results.path(), out.path(), "second").unwrap();

    let schema = read(&out.path().join(SCHEMA_FILE));
    assert!(schema.contains("Generated at: second"));
    assert!(!schema.contains("Generated at: first"));
}
