//! ODBC-based Snowflake warehouse client.
//!
//! Connects through the Snowflake ODBC driver, which must be installed and
//! registered as `SnowflakeDSIIDriver`:
//! - Linux: install the snowflake-odbc package and register the driver in
//!   `odbcinst.ini`
//! - macOS: `brew install --cask snowflake-snowsql` ships the driver
//! - Windows: download the driver installer from Snowflake

use crate::config::SourceConfig;
use crate::error::{MigrateError, Result};
use crate::warehouse::{DescribedColumn, WarehouseClient, WarehouseConnection};
use async_trait::async_trait;
use odbc_api::{
    buffers::TextRowSet, Connection, ConnectionOptions, Cursor, Environment, ResultSetMetadata,
};
use std::sync::OnceLock;
use tracing::debug;

/// Rows fetched per ODBC block cursor round-trip.
const ROWS_PER_FETCH: usize = 1024;

/// Upper bound on text length per cell; longer values are truncated by the
/// driver buffer.
const MAX_TEXT_LEN: usize = 8192;

static ODBC_ENV: OnceLock<Environment> = OnceLock::new();

/// Shared process-wide ODBC environment.
pub(crate) fn odbc_env() -> Result<&'static Environment> {
    if let Some(env) = ODBC_ENV.get() {
        return Ok(env);
    }
    let env = Environment::new().map_err(|e| {
        MigrateError::Warehouse(format!(
            "failed to create ODBC environment: {}. \
             Make sure an ODBC driver manager (unixODBC) is installed.",
            e
        ))
    })?;
    Ok(ODBC_ENV.get_or_init(|| env))
}

/// Escape an identifier for double-quoted notation.
pub(crate) fn escape_ident(s: &str) -> String {
    s.replace('"', "\"\"")
}

/// Snowflake warehouse client. Stateless: every [`connect`] call opens a
/// fresh ODBC connection.
///
/// [`connect`]: WarehouseClient::connect
#[derive(Debug, Default)]
pub struct SnowflakeWarehouse;

impl SnowflakeWarehouse {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WarehouseClient for SnowflakeWarehouse {
    async fn connect(&self, conn: &SourceConfig) -> Result<Box<dyn WarehouseConnection>> {
        let env = odbc_env()?;
        let connection_string = conn.odbc_connection_string();

        let connection = env
            .connect_with_connection_string(&connection_string, ConnectionOptions::default())
            .map_err(|e| {
                MigrateError::Warehouse(format!(
                    "failed to connect to Snowflake account {}: {}",
                    conn.account, e
                ))
            })?;

        debug!(
            "connected to Snowflake {}/{}.{}",
            conn.account, conn.database, conn.schema
        );

        Ok(Box::new(SnowflakeConnection { connection }))
    }
}

/// One open ODBC connection to Snowflake.
pub struct SnowflakeConnection {
    connection: Connection<'static>,
}

impl SnowflakeConnection {
    /// Execute a query and return all rows as text cells.
    fn run_text_query(&self, sql: &str) -> Result<Vec<Vec<Option<String>>>> {
        let mut rows = Vec::new();

        if let Some(mut cursor) = self
            .connection
            .execute(sql, ())
            .map_err(|e| MigrateError::Warehouse(format!("query failed: {} - SQL: {}", e, sql)))?
        {
            let num_cols = cursor.num_result_cols().map_err(|e| {
                MigrateError::Warehouse(format!("failed to get column count: {}", e))
            })? as usize;

            let mut buffers = TextRowSet::for_cursor(ROWS_PER_FETCH, &mut cursor, Some(MAX_TEXT_LEN))
                .map_err(|e| {
                    MigrateError::Warehouse(format!("failed to create row buffer: {}", e))
                })?;

            let mut row_cursor = cursor
                .bind_buffer(&mut buffers)
                .map_err(|e| MigrateError::Warehouse(format!("failed to bind buffer: {}", e)))?;

            while let Some(batch) = row_cursor
                .fetch()
                .map_err(|e| MigrateError::Warehouse(format!("failed to fetch rows: {}", e)))?
            {
                for row_idx in 0..batch.num_rows() {
                    let mut row = Vec::with_capacity(num_cols);
                    for col_idx in 0..num_cols {
                        let value = batch
                            .at(col_idx, row_idx)
                            .map(|bytes| String::from_utf8_lossy(bytes).to_string());
                        row.push(value);
                    }
                    rows.push(row);
                }
            }
        }

        Ok(rows)
    }
}

#[async_trait]
impl WarehouseConnection for SnowflakeConnection {
    async fn describe_table(&mut self, table: &str) -> Result<Vec<DescribedColumn>> {
        let sql = format!("DESCRIBE TABLE \"{}\"", escape_ident(table));
        let rows = self.run_text_query(&sql)?;

        // DESCRIBE TABLE reports name, type, kind, null?, ... - only the
        // first two matter here.
        let columns = rows
            .into_iter()
            .filter_map(|row| {
                let name = row.first().cloned().flatten()?;
                let data_type = row.get(1).cloned().flatten()?;
                Some(DescribedColumn { name, data_type })
            })
            .collect();

        Ok(columns)
    }

    async fn show_tables(&mut self) -> Result<Vec<String>> {
        let rows = self.run_text_query("SHOW TABLES")?;

        // SHOW TABLES reports created_on first; the table name is the
        // second column.
        let tables = rows
            .into_iter()
            .filter_map(|row| row.get(1).cloned().flatten())
            .collect();

        Ok(tables)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        // The ODBC handle disconnects on drop.
        drop(self);
        Ok(())
    }
}
