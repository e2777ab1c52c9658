//! Concrete compute-engine session over DataFusion and cloud object storage.
//!
//! The session registers a GCS-backed object store under the catalog's
//! warehouse URL, executes catalog DDL through a DataFusion
//! `SessionContext`, and materializes table data as Parquet files under
//! `<namespace>/<table>/` in the bucket. Overwrite removes every existing
//! object under a table's prefix before writing.

use crate::config::{SourceConfig, TargetConfig};
use crate::engine::{reader, DataSet, LakehouseEngine};
use crate::error::{MigrateError, Result};
use crate::schema::TableSchema;
use async_trait::async_trait;
use bytes::Bytes;
use datafusion::arrow::datatypes::SchemaRef;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::parquet::arrow::ArrowWriter;
use datafusion::prelude::{SessionConfig, SessionContext};
use futures::TryStreamExt;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Compute-engine session for one batch run.
pub struct LakehouseSession {
    ctx: SessionContext,
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl LakehouseSession {
    /// Open a session against the configured GCS bucket.
    pub fn open(target: &TargetConfig) -> Result<Self> {
        let store = GoogleCloudStorageBuilder::new()
            .with_bucket_name(&target.bucket)
            .with_service_account_path(&target.key_file)
            .build()?;

        Self::with_store(Arc::new(store), target)
    }

    /// Open a session over an explicit object store.
    ///
    /// Lets tests and local setups substitute an in-memory or filesystem
    /// store for the bucket.
    pub fn with_store(store: Arc<dyn ObjectStore>, target: &TargetConfig) -> Result<Self> {
        let config = SessionConfig::new()
            .with_information_schema(true)
            .with_default_catalog_and_schema(&target.catalog, &target.namespace);
        let ctx = SessionContext::new_with_config(config);

        let warehouse_url = target.warehouse_url();
        let url = Url::parse(&warehouse_url).map_err(|e| {
            MigrateError::Config(format!("invalid warehouse url {}: {}", warehouse_url, e))
        })?;
        ctx.register_object_store(&url, store.clone());

        info!(
            "lakehouse session ready: catalog {} at {}",
            target.catalog, warehouse_url
        );

        Ok(Self {
            ctx,
            store,
            bucket: target.bucket.clone(),
        })
    }
}

#[async_trait]
impl LakehouseEngine for LakehouseSession {
    async fn read_source_table(
        &self,
        conn: &SourceConfig,
        table: &str,
        schema: &TableSchema,
    ) -> Result<DataSet> {
        // The ODBC scan is blocking; keep it off the async worker thread.
        let conn = conn.clone();
        let table = table.to_string();
        let schema = schema.clone();
        tokio::task::spawn_blocking(move || reader::fetch_table(&conn, &table, &schema))
            .await
            .map_err(|e| MigrateError::Worker(format!("bulk read task failed: {}", e)))?
    }

    async fn execute_ddl(&self, sql: &str) -> Result<()> {
        debug!("executing DDL: {}", sql);
        self.ctx.sql(sql).await?;
        Ok(())
    }

    async fn overwrite_table(
        &self,
        namespace: &str,
        table: &str,
        schema: &TableSchema,
        data: DataSet,
    ) -> Result<()> {
        let prefix = Path::from(format!("{}/{}", namespace, table));

        // Full-overwrite semantics: clear the prefix before writing.
        let mut existing = self.store.list(Some(&prefix));
        let mut removed = 0usize;
        while let Some(meta) = existing.try_next().await? {
            self.store.delete(&meta.location).await?;
            removed += 1;
        }
        if removed > 0 {
            debug!("{}: removed {} stale objects under {}", table, removed, prefix);
        }

        let rows: usize = data.iter().map(|b| b.num_rows()).sum();
        let encoded = encode_parquet(schema.arrow_schema(), &data)?;
        let location = prefix.child("part-00000.parquet");
        self.store.put(&location, encoded.into()).await?;

        info!("{}: wrote {} rows to gs://{}/{}", table, rows, self.bucket, location);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        debug!("lakehouse session released");
        Ok(())
    }
}

/// Encode record batches as one in-memory Parquet file.
fn encode_parquet(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Bytes> {
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(Bytes::from(buf))
}
