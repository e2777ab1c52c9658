//! # snowflake-lake-migrate
//!
//! Batch migration of Snowflake tables into an object-storage lakehouse.
//!
//! One batch run enumerates every table in the configured database/schema,
//! introspects each table's columns, maps the types to the target table
//! format and re-materializes the full contents as Parquet under a catalog
//! rooted in a cloud bucket. A failing table is recorded and skipped; it
//! never aborts the batch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use snowflake_lake_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config)?;
//!     let outcome = orchestrator.run().await?;
//!     println!("migrated {} tables", outcome.tables_succeeded);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod migrate;
pub mod orchestrator;
pub mod schema;
pub mod typemap;
pub mod warehouse;

// Re-exports for convenient access
pub use config::{Config, SourceConfig, TargetConfig};
pub use engine::{DataSet, LakehouseEngine, LakehouseSession};
pub use error::{MigrateError, Result};
pub use migrate::TableMigrator;
pub use orchestrator::{BatchOutcome, MigrationEvent, Orchestrator, TableFailure};
pub use schema::{ColumnDescriptor, TableSchema};
pub use typemap::{map_source_type, LogicalType};
pub use warehouse::{
    describe_schema, list_tables, DescribedColumn, SnowflakeWarehouse, WarehouseClient,
    WarehouseConnection,
};
