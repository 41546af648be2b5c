//! Migration SQL generator.
//!
//! Turns the saved `Result_*.json` files into a directory of PostgreSQL
//! scripts: the schema, one upsert script per table and a README.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::dune::ExecutionResults;
use crate::error::{ExportError, Result};
use crate::output::{read_file, write_file};
use crate::sql::shapes::{self, TableShape};
use crate::sql::{render_schema, render_table_script};

pub const DEFAULT_RESULTS_DIR: &str = "Results";
pub const DEFAULT_OUTPUT_DIR: &str = "migration_sql";

pub const SCHEMA_FILE: &str = "01_create_schema.sql";
pub const README_FILE: &str = "README.md";

/// One input file and the script generated from it.
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    pub shape: &'static TableShape,
    /// Input file name inside the results directory.
    pub source: &'static str,
    /// Output file name inside the output directory.
    pub output: &'static str,
}

/// Data scripts in execution order, after the schema.
pub const STEPS: [MigrationStep; 4] = [
    MigrationStep {
        shape: &shapes::COLLATERAL,
        source: "Result_Collateral.json",
        output: "02_insert_collateral.sql",
    },
    MigrationStep {
        shape: &shapes::BORROW,
        source: "Result_Borrow.json",
        output: "03_insert_borrow.sql",
    },
    MigrationStep {
        shape: &shapes::DEX_VOLUME,
        source: "Result_DEX.json",
        output: "04_insert_dex.sql",
    },
    MigrationStep {
        shape: &shapes::EARN,
        source: "Result_Earn.json",
        output: "05_insert_earn.sql",
    },
];

const README: &str = r#"# Initial data migration

## Execution order

1. **Create the schema**
   ```sql
   psql -U username -d database_name -f 01_create_schema.sql
   ```

2. **Import the data**
   ```sql
   psql -U username -d database_name -f 02_insert_collateral.sql
   psql -U username -d database_name -f 03_insert_borrow.sql
   psql -U username -d database_name -f 04_insert_dex.sql
   psql -U username -d database_name -f 05_insert_earn.sql
   ```

## Run everything

Execute every SQL file in order:
```bash
for file in *.sql; do
    echo "Executing $file..."
    psql -U username -d database_name -f "$file"
done
```

## Transactions

Running inside a transaction is recommended:
```sql
BEGIN;
\i 01_create_schema.sql
\i 02_insert_collateral.sql
\i 03_insert_borrow.sql
\i 04_insert_dex.sql
\i 05_insert_earn.sql
COMMIT;
```

## Notes

- Every INSERT carries an ON CONFLICT clause, so re-running the scripts is safe
- Large inputs are split into batches of 1000 rows per statement
- The updated_at column is refreshed automatically on update
"#;

/// Loads one saved result file.
pub fn load_results(path: &Path) -> Result<ExecutionResults> {
    let content = read_file(path)?;
    serde_json::from_str(&content)
        .map_err(|e| ExportError::data_shape(format!("{}: invalid JSON: {}", path.display(), e)))
}

/// Renders the data script for one step.
pub fn render_step(step: &MigrationStep, results_dir: &Path, generated_at: &str) -> Result<String> {
    let source = results_dir.join(step.source);
    let results = load_results(&source)?;
    let rows = results.result.as_ref().map(|r| r.rows.as_slice()).ok_or_else(|| {
        ExportError::data_shape(format!("{}: no 'result.rows' in document", source.display()))
    })?;

    info!(table = step.shape.table, rows = rows.len(), "Rendering migration script");
    render_table_script(step.shape, rows, &source.display().to_string(), generated_at)
}

/// Generates the full migration directory.
///
/// All scripts are rendered before the output directory is touched; an
/// invalid input file aborts without writing anything.
pub fn generate_migration(
    results_dir: &Path,
    output_dir: &Path,
    generated_at: &str,
) -> Result<Vec<PathBuf>> {
    let mut outputs = vec![(SCHEMA_FILE, render_schema(generated_at))];
    for step in &STEPS {
        outputs.push((step.output, render_step(step, results_dir, generated_at)?));
    }
    outputs.push((README_FILE, README.to_string()));

    std::fs::create_dir_all(output_dir).map_err(|e| ExportError::io(output_dir, e))?;

    let mut written = Vec::with_capacity(outputs.len());
    for (name, content) in outputs {
        let path = output_dir.join(name);
        write_file(&path, &content)?;
        info!(path = %path.display(), "Generated");
        written.push(path);
    }
    Ok(written)
}
