//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Legacy validation
    if config.legacy.host.is_empty() {
        return Err(MigrateError::Config("legacy.host is required".into()));
    }
    if config.legacy.database.is_empty() {
        return Err(MigrateError::Config("legacy.database is required".into()));
    }
    if config.legacy.user.is_empty() {
        return Err(MigrateError::Config("legacy.user is required".into()));
    }
    // The prefix is spliced into SQL, so keep it to identifier characters
    if !config
        .legacy
        .table_prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(MigrateError::Config(format!(
            "legacy.table_prefix may only contain letters, digits and '_', got '{}'",
            config.legacy.table_prefix
        )));
    }

    // Target validation
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }

    // Cannot migrate into the legacy database
    if config.legacy.host == config.target.host
        && config.legacy.port == config.target.port
        && config.legacy.database == config.target.database
    {
        return Err(MigrateError::Config(
            "legacy and target cannot be the same database".into(),
        ));
    }

    if config.migration.short_post_threshold == 0 {
        return Err(MigrateError::Config(
            "migration.short_post_threshold must be at least 1".into(),
        ));
    }
    if config.migration.max_connections == 0 {
        return Err(MigrateError::Config(
            "migration.max_connections must be at least 1".into(),
        ));
    }

    Ok(())
}
