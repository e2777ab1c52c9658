//! Normalized schema types for source tables.
//!
//! A [`TableSchema`] is derived per table per run; nothing is cached across
//! tables, so schema drift between runs is tolerated by construction.

use crate::typemap::{map_source_type, LogicalType};
use datafusion::arrow::datatypes::{Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One column of a source table, mapped to its logical type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name as reported by the warehouse.
    pub name: String,

    /// Raw type name as reported by the warehouse (e.g. `NUMBER(38,0)`).
    pub source_type: String,

    /// Logical type in the target table format.
    pub logical: LogicalType,
}

impl ColumnDescriptor {
    /// Build a descriptor from the raw describe output, deriving the
    /// logical type through the type mapper.
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        let source_type = source_type.into();
        let logical = map_source_type(&source_type);
        Self {
            name: name.into(),
            source_type,
            logical,
        }
    }
}

/// Ordered column list for one table.
///
/// Column order matches the source table; it is used both to build the
/// target table definition and to shape the data write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub table: String,

    /// Columns in source order.
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Column names in source order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Arrow schema for the in-memory representation of this table.
    ///
    /// All fields are nullable; the describe output does not carry
    /// nullability and the overwrite write does not enforce it.
    pub fn arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(&c.name, c.logical.arrow_type(), true))
            .collect();
        Arc::new(Schema::new(fields))
    }
}
