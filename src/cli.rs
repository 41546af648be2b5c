//! Command-line argument parsing for dune-export.
//!
//! Uses clap to parse the `run` and `migrate` subcommands.

use crate::config::{Config, QueryConfig};
use crate::dune::QueryParams;
use crate::error::{ExportError, Result};
use crate::migration::{DEFAULT_OUTPUT_DIR, DEFAULT_RESULTS_DIR};
use crate::runner::DEFAULT_TABLE;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Run Dune queries and turn saved results into PostgreSQL migration scripts.
#[derive(Parser, Debug)]
#[command(name = "dune-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a query, wait for it and save the results
    Run(RunArgs),
    /// Generate migration SQL from saved result files
    Migrate(MigrateArgs),
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Query id or catalog key (collateral, borrow, dex-volume, earn)
    #[arg(short, long, value_name = "QUERY", default_value = "collateral")]
    pub query: String,

    /// Query parameter, repeatable (e.g., --param days=30)
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Table name used in the generated INSERT statements
    /// (defaults to the query's configured table, then price_data)
    #[arg(short, long, value_name = "TABLE")]
    pub table: Option<String>,

    /// Directory for Result.json and the derived files
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Polling timeout in seconds (defaults to the config value)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Seconds between status polls (defaults to the config value)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct MigrateArgs {
    /// Directory holding Result_*.json files
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_RESULTS_DIR)]
    pub results_dir: PathBuf,

    /// Directory the SQL scripts are written to
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path (CLI override or default).
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Default log filter when RUST_LOG is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

impl RunArgs {
    /// Target table: `--table`, else the query's table, else [`DEFAULT_TABLE`].
    pub fn table_for(&self, query: &QueryConfig) -> String {
        self.table
            .clone()
            .or_else(|| query.table.clone())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string())
    }

    /// Parses `NAME=VALUE` pairs into query parameters.
    ///
    /// Values that parse as JSON numbers or booleans keep that type; everything
    /// else is sent as a string.
    pub fn query_params(&self) -> Result<QueryParams> {
        let mut params = QueryParams::new();
        for raw in &self.params {
            let (name, value) = raw.split_once('=').ok_or_else(|| {
                ExportError::config(format!("Invalid parameter '{raw}'. Expected NAME=VALUE"))
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ExportError::config(format!(
                    "Invalid parameter '{raw}'. Name is empty"
                )));
            }
            params.insert(name.to_string(), parse_param_value(value));
        }
        Ok(params)
    }
}

fn parse_param_value(value: &str) -> Value {
    match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
        _ => Value::String(value.to_string()),
    }
}
