//! Compute-engine collaborator contract.
//!
//! The engine owns the heavy data path: bulk-reading a source table into
//! Arrow record batches, executing table-creation statements against the
//! catalog, and overwrite-writing batches into a catalog table. One session
//! is created per batch run and reused for every table; it is owned
//! exclusively by the batch worker.

pub mod reader;
pub mod session;

pub use session::LakehouseSession;

use crate::config::SourceConfig;
use crate::error::Result;
use crate::schema::TableSchema;
use async_trait::async_trait;
use datafusion::arrow::record_batch::RecordBatch;

/// In-memory tabular representation of one table's contents.
pub type DataSet = Vec<RecordBatch>;

/// One compute-engine session.
#[async_trait]
pub trait LakehouseEngine: Send + Sync {
    /// Pull the entire contents of a source table through the warehouse's
    /// bulk-read path, shaped by `schema`.
    async fn read_source_table(
        &self,
        conn: &SourceConfig,
        table: &str,
        schema: &TableSchema,
    ) -> Result<DataSet>;

    /// Execute a table-creation statement against the catalog.
    async fn execute_ddl(&self, sql: &str) -> Result<()>;

    /// Replace the full contents of a catalog table with `data`.
    ///
    /// Overwrite semantics, never append/merge: any prior contents are gone
    /// once this returns.
    async fn overwrite_table(
        &self,
        namespace: &str,
        table: &str,
        schema: &TableSchema,
        data: DataSet,
    ) -> Result<()>;

    /// Release the session.
    async fn close(&self) -> Result<()>;
}
