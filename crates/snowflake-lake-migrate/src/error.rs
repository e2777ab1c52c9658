//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Table enumeration failed. Batch-fatal: without a table list there is
    /// nothing to iterate, so the orchestrator aborts before any table runs.
    #[error("Table enumeration failed: {0}")]
    Enumeration(String),

    /// Schema introspection failed for one table. Caught at the per-table
    /// boundary in the orchestrator; the batch continues.
    #[error("Introspection failed for table {table}: {message}")]
    Introspection { table: String, message: String },

    /// Extract/create/load failed for one table. Caught at the per-table
    /// boundary in the orchestrator; the batch continues.
    #[error("Migration failed for table {table}: {message}")]
    Migration { table: String, message: String },

    /// Warehouse connection or query error. Classified into Enumeration,
    /// Introspection or Migration at the call site.
    #[error("Warehouse error: {0}")]
    Warehouse(String),

    /// Compute-engine session error
    #[error("Engine error: {0}")]
    Engine(#[from] datafusion::error::DataFusionError),

    /// Object storage error
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// Arrow data error
    #[error("Arrow error: {0}")]
    Arrow(#[from] datafusion::arrow::error::ArrowError),

    /// Parquet encoding error
    #[error("Parquet error: {0}")]
    Parquet(#[from] datafusion::parquet::errors::ParquetError),

    /// Background worker failure (panic or runtime shutdown)
    #[error("Worker error: {0}")]
    Worker(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create an Introspection error for a table.
    pub fn introspection(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Introspection {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Migration error for a table.
    pub fn migration(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Migration {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) => 2,
            MigrateError::Enumeration(_) => 3,
            _ => 1,
        }
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
