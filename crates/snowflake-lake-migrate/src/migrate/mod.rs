//! Per-table migration: read, create-if-absent, overwrite-write.

use crate::config::{SourceConfig, TargetConfig};
use crate::engine::LakehouseEngine;
use crate::error::{MigrateError, Result};
use crate::schema::TableSchema;
use std::sync::Arc;
use tracing::debug;

/// Migrates one table at a time through a shared engine session.
pub struct TableMigrator {
    engine: Arc<dyn LakehouseEngine>,
    target: TargetConfig,
}

impl TableMigrator {
    pub fn new(engine: Arc<dyn LakehouseEngine>, target: TargetConfig) -> Self {
        Self { engine, target }
    }

    /// Migrate one table, in order:
    ///
    /// 1. bulk-read the full table contents from the warehouse,
    /// 2. create the target table from the normalized schema if it does not
    ///    exist yet,
    /// 3. write the data into the target table, replacing any prior
    ///    contents.
    ///
    /// The source is never mutated. Any failure is wrapped as
    /// [`MigrateError::Migration`] and returned to the caller; there are no
    /// retries at this level.
    pub async fn migrate(&self, conn: &SourceConfig, schema: &TableSchema) -> Result<()> {
        self.steps(conn, schema)
            .await
            .map_err(|e| MigrateError::migration(&schema.table, e.to_string()))
    }

    async fn steps(&self, conn: &SourceConfig, schema: &TableSchema) -> Result<()> {
        let table = schema.table.as_str();

        let data = self.engine.read_source_table(conn, table, schema).await?;
        debug!(
            "{}: read {} batches from source",
            table,
            data.len()
        );

        let ddl = build_create_table(&self.target, schema);
        self.engine.execute_ddl(&ddl).await?;

        self.engine
            .overwrite_table(&self.target.namespace, table, schema, data)
            .await?;

        Ok(())
    }
}

/// Render the target table-creation statement for a schema.
///
/// One column definition per descriptor, order-preserving, with the stable
/// type-name strings from [`LogicalType::target_type`]. `IF NOT EXISTS`
/// keeps re-runs against an existing target table working.
///
/// [`LogicalType::target_type`]: crate::typemap::LogicalType::target_type
pub fn build_create_table(target: &TargetConfig, schema: &TableSchema) -> String {
    let columns = schema
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.logical.target_type()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE EXTERNAL TABLE IF NOT EXISTS {} ({}) STORED AS PARQUET LOCATION '{}'",
        quote_ident(&schema.table),
        columns,
        target.table_location(&schema.table),
    )
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDescriptor;

    fn target() -> TargetConfig {
        TargetConfig {
            bucket: "lake-bucket".to_string(),
            key_file: "/etc/keys/svc.json".to_string(),
            catalog: "lake".to_string(),
            namespace: "default".to_string(),
        }
    }

    #[test]
    fn test_build_create_table() {
        let schema = TableSchema::new(
            "ORDERS",
            vec![
                ColumnDescriptor::new("ID", "NUMBER(38,0)"),
                ColumnDescriptor::new("CUSTOMER", "VARCHAR(255)"),
                ColumnDescriptor::new("CREATED", "TIMESTAMP"),
            ],
        );

        let ddl = build_create_table(&target(), &schema);
        assert_eq!(
            ddl,
            "CREATE EXTERNAL TABLE IF NOT EXISTS \"ORDERS\" \
             (\"ID\" DECIMAL(38,10), \"CUSTOMER\" STRING, \"CREATED\" TIMESTAMP) \
             STORED AS PARQUET LOCATION 'gs://lake-bucket/default/ORDERS/'"
        );
    }

    #[test]
    fn test_unmapped_type_renders_as_string() {
        let schema = TableSchema::new("GEO", vec![ColumnDescriptor::new("SHAPE", "GEOGRAPHY")]);
        let ddl = build_create_table(&target(), &schema);
        assert!(ddl.contains("\"SHAPE\" STRING"));
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("A\"B"), "\"A\"\"B\"");
    }
}
