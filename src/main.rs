//! dune-export - Run Dune queries and build PostgreSQL migration scripts.

use dune_export::cli::{Cli, Command, MigrateArgs, RunArgs};
use dune_export::config::Config;
use dune_export::dune::{DuneClient, ExecutionRequest, PollOptions};
use dune_export::error::{ExportError, Result};
use dune_export::logging;
use dune_export::migration::generate_migration;
use dune_export::output::generation_timestamp;
use dune_export::runner::{run_query, RunOptions};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env is fine; variables may come from the shell.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.log_level());

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.dune.apply_env_overrides();
    config.dune.validate()?;

    match &cli.command {
        Command::Run(args) => run_command(&config, args).await,
        Command::Migrate(args) => migrate_command(args),
    }
}

async fn run_command(config: &Config, args: &RunArgs) -> Result<()> {
    let query = config.resolve_query(&args.query)?;
    info!(query_id = query.id, name = %query.name, "Resolved query");

    if args.interval == Some(0) {
        return Err(ExportError::config("--interval must be at least 1 second"));
    }

    let request = ExecutionRequest::new(query.id).with_params(args.query_params()?);
    let poll = PollOptions::from_secs(
        args.timeout.unwrap_or(config.dune.timeout_secs),
        args.interval.unwrap_or(config.dune.poll_interval_secs),
    );
    let options = RunOptions::new(request)
        .with_table(args.table_for(&query))
        .with_output_dir(args.output_dir.clone())
        .with_poll(poll);

    let client = DuneClient::from_env(&config.dune)?;
    let summary = run_query(&client, &options).await?;

    println!("Query {} ({})", summary.metadata.query_id, query.name);
    println!("  Execution: {}", summary.metadata.execution_id);
    println!("  Rows: {}", summary.metadata.row_count);
    if !summary.metadata.columns.is_empty() {
        println!("  Columns: {}", summary.metadata.columns.join(", "));
    }
    for (i, line) in summary.preview.iter().enumerate() {
        println!("  {}. {}", i + 1, line);
    }
    for file in &summary.files {
        println!("  Wrote {}", file.display());
    }

    Ok(())
}

fn migrate_command(args: &MigrateArgs) -> Result<()> {
    let files = generate_migration(&args.results_dir, &args.output_dir, &generation_timestamp())?;

    for file in &files {
        println!("Generated: {}", file.display());
    }
    println!(
        "All migration SQL files written to {}",
        args.output_dir.display()
    );

    Ok(())
}
