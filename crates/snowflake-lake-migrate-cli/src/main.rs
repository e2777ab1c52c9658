//! snowflake-lake-migrate CLI - Snowflake to object-storage lakehouse migration.

use clap::{Parser, Subcommand};
use snowflake_lake_migrate::{
    describe_schema, list_tables, Config, MigrateError, Orchestrator, SnowflakeWarehouse,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "snowflake-lake-migrate")]
#[command(about = "Migrate Snowflake tables into an object-storage lakehouse")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every table in the configured database/schema
    Run,

    /// List the tables that a run would migrate
    ListTables,

    /// Show the mapped schema of one table
    Describe {
        /// Table name
        table: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let config = Config::load(&cli.config)?;
    info!("loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run => {
            let (tx, mut rx) = mpsc::unbounded_channel();
            let orchestrator = Orchestrator::new(config)?.with_events(tx);

            // The batch runs on a background worker; this task only renders
            // events as they arrive.
            let worker = tokio::spawn(orchestrator.run());

            while let Some(event) = rx.recv().await {
                println!("{}", event);
            }

            let outcome = worker
                .await
                .map_err(|e| MigrateError::Worker(format!("batch worker failed: {}", e)))??;

            if cli.output_json {
                println!("{}", outcome.to_json()?);
            } else {
                println!("\nMigration {}!", outcome.status);
                println!("  Run ID: {}", outcome.run_id);
                println!("  Duration: {:.2}s", outcome.duration_seconds);
                println!(
                    "  Tables: {}/{}",
                    outcome.tables_succeeded, outcome.tables_attempted
                );
                if !outcome.tables_failed.is_empty() {
                    println!("  Failed tables:");
                    for failure in &outcome.tables_failed {
                        println!("    {}: {}", failure.table, failure.reason);
                    }
                }
                if let Some(error) = &outcome.error {
                    println!("  Error: {}", error);
                }
            }

            if outcome.status == "aborted" {
                let reason = outcome
                    .error
                    .unwrap_or_else(|| "table enumeration failed".to_string());
                return Err(MigrateError::Enumeration(reason));
            }
        }

        Commands::ListTables => {
            let warehouse = SnowflakeWarehouse::new();
            let tables = list_tables(&warehouse, &config.source).await?;
            for table in &tables {
                println!("{}", table);
            }
            eprintln!("{} tables", tables.len());
        }

        Commands::Describe { table } => {
            let warehouse = SnowflakeWarehouse::new();
            let schema = describe_schema(&warehouse, &config.source, &table).await?;
            for column in &schema.columns {
                println!(
                    "{}  {}  ({})",
                    column.name,
                    column.logical.target_type(),
                    column.source_type
                );
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
