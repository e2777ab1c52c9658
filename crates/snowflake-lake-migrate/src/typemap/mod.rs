//! Type mapping between Snowflake and the target table format.

use datafusion::arrow::datatypes::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};

/// Decimal precision carried through DDL and the Arrow data path.
pub(crate) const DECIMAL_PRECISION: u8 = 38;
/// Decimal scale carried through DDL and the Arrow data path.
pub(crate) const DECIMAL_SCALE: i8 = 10;

/// Logical column type in the target table format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    String,
    Decimal,
    Integer,
    Long,
    Boolean,
    Date,
    Timestamp,
    Float,
}

impl LogicalType {
    /// Stable type-name string used in target DDL.
    ///
    /// These are pinned explicitly rather than derived from any engine's
    /// Display rendering, so the created tables keep the same column types
    /// across engine upgrades.
    pub fn target_type(&self) -> &'static str {
        match self {
            LogicalType::String => "STRING",
            LogicalType::Decimal => "DECIMAL(38,10)",
            LogicalType::Integer => "INT",
            LogicalType::Long => "BIGINT",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::Date => "DATE",
            LogicalType::Timestamp => "TIMESTAMP",
            LogicalType::Float => "FLOAT",
        }
    }

    /// Arrow type used for the in-memory representation of a column.
    pub fn arrow_type(&self) -> DataType {
        match self {
            LogicalType::String => DataType::Utf8,
            LogicalType::Decimal => DataType::Decimal128(DECIMAL_PRECISION, DECIMAL_SCALE),
            LogicalType::Integer => DataType::Int32,
            LogicalType::Long => DataType::Int64,
            LogicalType::Boolean => DataType::Boolean,
            LogicalType::Date => DataType::Date32,
            LogicalType::Timestamp => DataType::Timestamp(TimeUnit::Nanosecond, None),
            LogicalType::Float => DataType::Float64,
        }
    }
}

/// Map a Snowflake data type name to a logical type.
///
/// Total: unrecognized names degrade to [`LogicalType::String`] instead of
/// failing, which favors availability of the migration over strict fidelity.
/// `DESCRIBE TABLE` reports parameterized names (`NUMBER(38,0)`,
/// `VARCHAR(16777216)`), so the argument list is stripped before matching.
pub fn map_source_type(source_type: &str) -> LogicalType {
    let bare = source_type
        .split('(')
        .next()
        .unwrap_or(source_type)
        .trim()
        .to_uppercase();

    match bare.as_str() {
        "STRING" | "VARCHAR" => LogicalType::String,
        "NUMBER" | "DECIMAL" => LogicalType::Decimal,
        "INTEGER" => LogicalType::Integer,
        "BIGINT" => LogicalType::Long,
        "BOOLEAN" => LogicalType::Boolean,
        "DATE" => LogicalType::Date,
        "TIMESTAMP" => LogicalType::Timestamp,
        "FLOAT" => LogicalType::Float,
        _ => LogicalType::String,
    }
}
