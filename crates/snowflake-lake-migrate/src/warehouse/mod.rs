//! Warehouse collaborator contract plus schema introspection and table
//! enumeration built on top of it.
//!
//! Connections are scoped to a single call: every operation here opens a
//! connection, runs its query and closes the connection before returning.
//! That costs a round-trip per table but avoids connection lifetime bugs
//! across a long batch.

pub mod snowflake;

pub use snowflake::SnowflakeWarehouse;

use crate::config::SourceConfig;
use crate::error::{MigrateError, Result};
use crate::schema::{ColumnDescriptor, TableSchema};
use async_trait::async_trait;
use tracing::debug;

/// One row of `DESCRIBE TABLE` output. Extra metadata columns beyond the
/// name and type are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedColumn {
    /// Column name.
    pub name: String,
    /// Raw type name (e.g. `NUMBER(38,0)`).
    pub data_type: String,
}

/// Factory for warehouse connections.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Open a connection with the given parameters.
    async fn connect(&self, conn: &SourceConfig) -> Result<Box<dyn WarehouseConnection>>;
}

/// One open warehouse connection.
///
/// The caller must close it explicitly once done; dropping without `close`
/// still releases the underlying handle.
#[async_trait]
pub trait WarehouseConnection: Send {
    /// Run `DESCRIBE TABLE <table>` and return (name, type) per column in
    /// source order.
    async fn describe_table(&mut self, table: &str) -> Result<Vec<DescribedColumn>>;

    /// Run `SHOW TABLES` and return the table-name field of each row.
    async fn show_tables(&mut self) -> Result<Vec<String>>;

    /// Close the connection.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Introspect one table's schema.
///
/// Opens a connection, describes the table, maps every column through the
/// type mapper and closes the connection. Failures are not caught here:
/// they propagate as [`MigrateError::Introspection`] to the per-table
/// failure boundary in the orchestrator.
pub async fn describe_schema(
    client: &dyn WarehouseClient,
    conn: &SourceConfig,
    table: &str,
) -> Result<TableSchema> {
    let described = async {
        let mut connection = client.connect(conn).await?;
        let described = connection.describe_table(table).await?;
        connection.close().await?;
        Ok::<_, MigrateError>(described)
    }
    .await
    .map_err(|e| MigrateError::introspection(table, e.to_string()))?;

    let columns: Vec<ColumnDescriptor> = described
        .into_iter()
        .map(|c| ColumnDescriptor::new(c.name, c.data_type))
        .collect();

    debug!("described {} columns for {}", columns.len(), table);
    Ok(TableSchema::new(table, columns))
}

/// Enumerate the tables in the configured database/schema scope.
///
/// Opens a connection, lists tables and closes the connection. Failure here
/// is batch-fatal, surfaced as [`MigrateError::Enumeration`].
pub async fn list_tables(
    client: &dyn WarehouseClient,
    conn: &SourceConfig,
) -> Result<Vec<String>> {
    let tables = async {
        let mut connection = client.connect(conn).await?;
        let tables = connection.show_tables().await?;
        connection.close().await?;
        Ok::<_, MigrateError>(tables)
    }
    .await
    .map_err(|e| MigrateError::Enumeration(e.to_string()))?;

    debug!(
        "enumerated {} tables in {}.{}",
        tables.len(),
        conn.database,
        conn.schema
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typemap::LogicalType;

    struct ScriptedClient {
        fail_connect: bool,
    }

    struct ScriptedConnection;

    #[async_trait]
    impl WarehouseClient for ScriptedClient {
        async fn connect(&self, _conn: &SourceConfig) -> Result<Box<dyn WarehouseConnection>> {
            if self.fail_connect {
                return Err(MigrateError::Warehouse("network unreachable".into()));
            }
            Ok(Box::new(ScriptedConnection))
        }
    }

    #[async_trait]
    impl WarehouseConnection for ScriptedConnection {
        async fn describe_table(&mut self, table: &str) -> Result<Vec<DescribedColumn>> {
            if table == "BROKEN" {
                return Err(MigrateError::Warehouse("table not found".into()));
            }
            Ok(vec![
                DescribedColumn {
                    name: "ID".into(),
                    data_type: "NUMBER(38,0)".into(),
                },
                DescribedColumn {
                    name: "NAME".into(),
                    data_type: "VARCHAR(64)".into(),
                },
            ])
        }

        async fn show_tables(&mut self) -> Result<Vec<String>> {
            Ok(vec!["A".into(), "B".into()])
        }

        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn source() -> SourceConfig {
        crate::config::Config::from_yaml(
            "source:\n  account: a\n  user: u\n  password: p\n  warehouse: w\n  database: d\n\
             target:\n  bucket: b\n  key_file: k\n",
        )
        .unwrap()
        .source
    }

    #[tokio::test]
    async fn test_describe_schema_maps_columns_in_order() {
        let client = ScriptedClient {
            fail_connect: false,
        };
        let schema = describe_schema(&client, &source(), "ORDERS").await.unwrap();
        assert_eq!(schema.table, "ORDERS");
        assert_eq!(schema.column_names(), vec!["ID", "NAME"]);
        assert_eq!(schema.columns[0].logical, LogicalType::Decimal);
        assert_eq!(schema.columns[1].logical, LogicalType::String);
    }

    #[tokio::test]
    async fn test_describe_failure_becomes_introspection_error() {
        let client = ScriptedClient {
            fail_connect: false,
        };
        let err = describe_schema(&client, &source(), "BROKEN")
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::Introspection { ref table, .. } if table == "BROKEN"));
    }

    #[tokio::test]
    async fn test_connect_failure_becomes_enumeration_error() {
        let client = ScriptedClient { fail_connect: true };
        let err = list_tables(&client, &source()).await.unwrap_err();
        assert!(matches!(err, MigrateError::Enumeration(_)));
        assert!(err.to_string().contains("network unreachable"));
    }

    #[tokio::test]
    async fn test_list_tables() {
        let client = ScriptedClient {
            fail_connect: false,
        };
        let tables = list_tables(&client, &source()).await.unwrap();
        assert_eq!(tables, vec!["A", "B"]);
    }
}
