//! Warehouse-native bulk reader.
//!
//! Reads a full table in one block-cursor scan: the ODBC driver fills large
//! columnar text buffers per round-trip, and each fetched buffer is turned
//! into an Arrow [`RecordBatch`] shaped by the table's [`TableSchema`].
//! Cell values that do not parse as their mapped logical type become nulls
//! rather than failing the table.

use crate::config::SourceConfig;
use crate::error::{MigrateError, Result};
use crate::schema::TableSchema;
use crate::typemap::{LogicalType, DECIMAL_PRECISION, DECIMAL_SCALE};
use crate::warehouse::snowflake::{escape_ident, odbc_env};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use datafusion::arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Decimal128Array, Float64Array, Int32Array, Int64Array,
    StringArray, TimestampNanosecondArray,
};
use datafusion::arrow::record_batch::RecordBatch;
use odbc_api::{buffers::TextRowSet, ConnectionOptions, Cursor, ResultSetMetadata};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Rows per block-cursor fetch.
const ROWS_PER_FETCH: usize = 4096;

/// Text buffer bound per cell; the driver truncates longer values.
const MAX_TEXT_LEN: usize = 8192;

/// Days from the common era to 1970-01-01, for Date32 conversion.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Read the full contents of `table` into Arrow record batches.
///
/// Blocking: runs the ODBC scan on the calling thread. The engine session
/// dispatches it through `spawn_blocking`.
pub(crate) fn fetch_table(
    conn: &SourceConfig,
    table: &str,
    schema: &TableSchema,
) -> Result<Vec<RecordBatch>> {
    let env = odbc_env()?;
    let connection = env
        .connect_with_connection_string(&conn.odbc_connection_string(), ConnectionOptions::default())
        .map_err(|e| {
            MigrateError::Warehouse(format!(
                "failed to connect to Snowflake account {}: {}",
                conn.account, e
            ))
        })?;

    let column_list = schema
        .columns
        .iter()
        .map(|c| format!("\"{}\"", escape_ident(&c.name)))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT {} FROM \"{}\"", column_list, escape_ident(table));

    let mut batches = Vec::new();

    if let Some(mut cursor) = connection
        .execute(&sql, ())
        .map_err(|e| MigrateError::Warehouse(format!("bulk read failed: {} - SQL: {}", e, sql)))?
    {
        let num_cols = cursor
            .num_result_cols()
            .map_err(|e| MigrateError::Warehouse(format!("failed to get column count: {}", e)))?
            as usize;
        if num_cols != schema.columns.len() {
            return Err(MigrateError::Warehouse(format!(
                "column count mismatch for {}: described {}, scan returned {}",
                table,
                schema.columns.len(),
                num_cols
            )));
        }

        let mut buffers = TextRowSet::for_cursor(ROWS_PER_FETCH, &mut cursor, Some(MAX_TEXT_LEN))
            .map_err(|e| MigrateError::Warehouse(format!("failed to create row buffer: {}", e)))?;

        let mut row_cursor = cursor
            .bind_buffer(&mut buffers)
            .map_err(|e| MigrateError::Warehouse(format!("failed to bind buffer: {}", e)))?;

        while let Some(text_batch) = row_cursor
            .fetch()
            .map_err(|e| MigrateError::Warehouse(format!("failed to fetch rows: {}", e)))?
        {
            let rows: Vec<Vec<Option<String>>> = (0..text_batch.num_rows())
                .map(|row_idx| {
                    (0..num_cols)
                        .map(|col_idx| {
                            text_batch
                                .at(col_idx, row_idx)
                                .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                        })
                        .collect()
                })
                .collect();

            batches.push(rows_to_batch(schema, &rows)?);
        }
    }

    let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    debug!("{}: bulk read {} rows in {} batches", table, total_rows, batches.len());

    Ok(batches)
}

/// Convert one buffer's worth of text rows into a [`RecordBatch`].
pub(crate) fn rows_to_batch(
    schema: &TableSchema,
    rows: &[Vec<Option<String>>],
) -> Result<RecordBatch> {
    let arrays: Vec<ArrayRef> = schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, col)| column_array(col.logical, rows, idx))
        .collect::<Result<_>>()?;

    RecordBatch::try_new(schema.arrow_schema(), arrays).map_err(Into::into)
}

fn cell<'a>(row: &'a [Option<String>], idx: usize) -> Option<&'a str> {
    row.get(idx).and_then(|v| v.as_deref())
}

fn column_array(
    logical: LogicalType,
    rows: &[Vec<Option<String>>],
    idx: usize,
) -> Result<ArrayRef> {
    let array: ArrayRef = match logical {
        LogicalType::String => {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|r| cell(r, idx).map(str::to_string))
                .collect();
            Arc::new(StringArray::from(values))
        }
        LogicalType::Integer => {
            let values: Vec<Option<i32>> = rows
                .iter()
                .map(|r| cell(r, idx).and_then(|s| s.trim().parse().ok()))
                .collect();
            Arc::new(Int32Array::from(values))
        }
        LogicalType::Long => {
            let values: Vec<Option<i64>> = rows
                .iter()
                .map(|r| cell(r, idx).and_then(|s| s.trim().parse().ok()))
                .collect();
            Arc::new(Int64Array::from(values))
        }
        LogicalType::Float => {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|r| cell(r, idx).and_then(|s| s.trim().parse().ok()))
                .collect();
            Arc::new(Float64Array::from(values))
        }
        LogicalType::Boolean => {
            let values: Vec<Option<bool>> = rows
                .iter()
                .map(|r| cell(r, idx).and_then(parse_bool))
                .collect();
            Arc::new(BooleanArray::from(values))
        }
        LogicalType::Date => {
            let values: Vec<Option<i32>> = rows
                .iter()
                .map(|r| cell(r, idx).and_then(parse_date))
                .collect();
            Arc::new(Date32Array::from(values))
        }
        LogicalType::Timestamp => {
            let values: Vec<Option<i64>> = rows
                .iter()
                .map(|r| cell(r, idx).and_then(parse_timestamp))
                .collect();
            Arc::new(TimestampNanosecondArray::from(values))
        }
        LogicalType::Decimal => {
            let values: Vec<Option<i128>> = rows
                .iter()
                .map(|r| cell(r, idx).and_then(parse_decimal))
                .collect();
            Arc::new(
                Decimal128Array::from(values)
                    .with_precision_and_scale(DECIMAL_PRECISION, DECIMAL_SCALE)?,
            )
        }
    };

    Ok(array)
}

fn parse_bool(s: &str) -> Option<bool> {
    let t = s.trim();
    if t == "1" || t.eq_ignore_ascii_case("true") {
        Some(true)
    } else if t == "0" || t.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<i32> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

fn parse_timestamp(s: &str) -> Option<i64> {
    let t = s.trim();
    let dt = NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()?;
    dt.and_utc().timestamp_nanos_opt()
}

fn parse_decimal(s: &str) -> Option<i128> {
    let mut d = Decimal::from_str(s.trim()).ok()?;
    d.rescale(DECIMAL_SCALE as u32);
    Some(d.mantissa())
}
