//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.account.is_empty() {
        return Err(MigrateError::Config("source.account is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(MigrateError::Config("source.user is required".into()));
    }
    if config.source.password.is_empty() {
        return Err(MigrateError::Config("source.password is required".into()));
    }
    if config.source.warehouse.is_empty() {
        return Err(MigrateError::Config("source.warehouse is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(MigrateError::Config("source.database is required".into()));
    }

    // Target validation
    if config.target.bucket.is_empty() {
        return Err(MigrateError::Config("target.bucket is required".into()));
    }
    if config.target.bucket.contains('/') {
        return Err(MigrateError::Config(
            "target.bucket must be a bare bucket name, not a path".into(),
        ));
    }
    if config.target.key_file.is_empty() {
        return Err(MigrateError::Config("target.key_file is required".into()));
    }
    if config.target.catalog.is_empty() {
        return Err(MigrateError::Config("target.catalog is required".into()));
    }
    if config.target.namespace.is_empty() {
        return Err(MigrateError::Config("target.namespace is required".into()));
    }

    Ok(())
}
