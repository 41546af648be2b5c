//! SQL text generation.
//!
//! Renders result rows into batched PostgreSQL upserts for the fixed table
//! shapes, flat per-row inserts for ad-hoc query results, and the schema
//! script.

pub mod flat;
pub mod schema;
pub mod shapes;

pub use flat::render_flat_inserts;
pub use schema::render_schema;
pub use shapes::{Column, TableShape};

use serde_json::Value;

use crate::dune::Row;
use crate::error::{ExportError, Result};

/// Rows per INSERT statement.
pub const BATCH_SIZE: usize = 1000;

/// Renders one value as a SQL literal.
///
/// Null becomes `NULL`, numbers stay unquoted, everything else is quoted with
/// embedded single quotes doubled.
pub fn escape_scalar(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// A contiguous run of at most [`BATCH_SIZE`] rows.
#[derive(Debug, Clone, Copy)]
pub struct SqlBatch<'a> {
    /// 1-based batch number.
    pub number: usize,
    pub rows: &'a [Row],
}

/// Splits rows into batches of [`BATCH_SIZE`].
pub fn batches(rows: &[Row]) -> impl Iterator<Item = SqlBatch<'_>> {
    rows.chunks(BATCH_SIZE)
        .enumerate()
        .map(|(i, rows)| SqlBatch { number: i + 1, rows })
}

/// Renders the value tuple of one row in the shape's column order.
///
/// `index` is the row's position in the whole input and only used for error
/// messages.
fn render_tuple(shape: &TableShape, row: &Row, index: usize) -> Result<String> {
    let mut values = Vec::with_capacity(shape.columns.len());
    for column in shape.columns {
        let value = match row.get(column.name) {
            Some(value) => escape_scalar(value),
            None if column.optional => "NULL".to_string(),
            None => {
                return Err(ExportError::data_shape(format!(
                    "{}: row {} is missing required field '{}'",
                    shape.table, index, column.name
                )))
            }
        };
        values.push(value);
    }
    Ok(format!("({})", values.join(", ")))
}

fn render_batch(shape: &TableShape, batch: SqlBatch<'_>) -> Result<String> {
    let first_index = (batch.number - 1) * BATCH_SIZE;
    let tuples = batch
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| render_tuple(shape, row, first_index + i).map(|t| format!("    {t}")))
        .collect::<Result<Vec<_>>>()?;

    let mut assignments: Vec<String> = shape
        .update_columns
        .iter()
        .map(|col| format!("    {col} = EXCLUDED.{col}"))
        .collect();
    if let Some(col) = shape.touch_column {
        assignments.push(format!("    {col} = CURRENT_TIMESTAMP"));
    }

    let mut lines = vec![
        format!("-- Batch {}", batch.number),
        format!("INSERT INTO {}", shape.table),
        format!("    ({})", shape.column_names().join(", ")),
        "VALUES".to_string(),
        tuples.join(",\n"),
        format!("ON CONFLICT ({})", shape.conflict_key.join(", ")),
    ];
    if assignments.is_empty() {
        lines.push("DO NOTHING;".to_string());
    } else {
        lines.push("DO UPDATE SET".to_string());
        lines.push(format!("{};", assignments.join(",\n")));
    }

    Ok(lines.join("\n") + "\n\n")
}

/// Renders all rows as one upsert statement per batch.
///
/// An empty input yields a single comment line.
pub fn render_insert_batch(rows: &[Row], shape: &TableShape) -> Result<String> {
    if rows.is_empty() {
        return Ok(format!("-- No rows to insert into {}\n", shape.table));
    }

    batches(rows)
        .map(|batch| render_batch(shape, batch))
        .collect::<Result<Vec<_>>>()
        .map(|statements| statements.concat())
}

/// Renders a complete data script for one table: header comments then the
/// batched upserts.
pub fn render_table_script(
    shape: &TableShape,
    rows: &[Row],
    source: &str,
    generated_at: &str,
) -> Result<String> {
    let body = render_insert_batch(rows, shape)?;
    Ok(format!(
        "-- {} data migration\n-- Generated at: {}\n-- Source: {}\n\n-- Total rows: {}\n\n{}",
        shape.description,
        generated_at,
        source,
        rows.len(),
        body
    ))
}
