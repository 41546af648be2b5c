//! Flat single-row INSERT statements for ad-hoc query results.
//!
//! Columns come from the first row's keys, so any query result can be dumped
//! without a predeclared table shape.

use serde_json::Value;

use crate::dune::ExecutionResults;
use crate::sql::escape_scalar;

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders one `INSERT INTO table (...) VALUES (...);` per row.
///
/// A document without `result` renders `-- No data found`; an empty row list
/// renders `-- No rows found`. Keys absent from a later row render `NULL`.
pub fn render_flat_inserts(results: &ExecutionResults, table: &str, generated_at: &str) -> String {
    let Some(result) = &results.result else {
        return "-- No data found".to_string();
    };
    if result.rows.is_empty() {
        return "-- No rows found".to_string();
    }

    let columns = result.columns();
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        format!("-- SQL INSERT statements for table: {table}"),
        format!("-- Generated at: {generated_at}"),
        format!("-- Total rows: {}", result.rows.len()),
        String::new(),
    ];

    for row in &result.rows {
        let values = columns
            .iter()
            .map(|c| escape_scalar(row.get(c).unwrap_or(&Value::Null)))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("INSERT INTO {table} ({column_list}) VALUES ({values});"));
    }

    lines.join("\n")
}
