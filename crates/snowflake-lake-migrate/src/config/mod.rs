//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Fully qualified Snowflake server hostname.
    pub fn server_url(&self) -> String {
        format!("{}.snowflakecomputing.com", self.account)
    }

    /// Build a connection string for the Snowflake ODBC driver.
    pub fn odbc_connection_string(&self) -> String {
        format!(
            "Driver={{SnowflakeDSIIDriver}};\
             Server={};\
             Database={};\
             Schema={};\
             Warehouse={};\
             Role={};\
             UID={};\
             PWD={};",
            self.server_url(),
            self.database,
            self.schema,
            self.warehouse,
            self.role,
            self.user,
            self.password,
        )
    }
}
