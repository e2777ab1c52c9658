//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source warehouse configuration (Snowflake).
    pub source: SourceConfig,

    /// Target lakehouse configuration (object storage).
    pub target: TargetConfig,
}

/// Source warehouse (Snowflake) connection parameters.
///
/// Captured once per batch run and never persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Account identifier (e.g. "xy12345.us-east-1").
    pub account: String,

    /// Username.
    pub user: String,

    /// Password.
    pub password: String,

    /// Compute warehouse name.
    pub warehouse: String,

    /// Database name.
    pub database: String,

    /// Schema (default: "PUBLIC").
    #[serde(default = "default_source_schema")]
    pub schema: String,

    /// Role (default: "PUBLIC").
    #[serde(default = "default_role")]
    pub role: String,
}

// Manual Debug so the password never reaches logs.
impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .finish()
    }
}

/// Target lakehouse configuration.
///
/// The catalog's warehouse root lives at `gs://<bucket>/`; the key file is a
/// service-account credential granting write access to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Object storage bucket name.
    pub bucket: String,

    /// Path to the service-account JSON key file.
    pub key_file: String,

    /// Catalog name (default: "lake").
    #[serde(default = "default_catalog")]
    pub catalog: String,

    /// Namespace for migrated tables (default: "default").
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl TargetConfig {
    /// Root URL of the catalog warehouse.
    pub fn warehouse_url(&self) -> String {
        format!("gs://{}", self.bucket)
    }

    /// Storage location for one table's data files.
    pub fn table_location(&self, table: &str) -> String {
        format!("gs://{}/{}/{}/", self.bucket, self.namespace, table)
    }
}

// Default value functions for serde
fn default_source_schema() -> String {
    "PUBLIC".to_string()
}

fn default_role() -> String {
    "PUBLIC".to_string()
}

fn default_catalog() -> String {
    "lake".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}
