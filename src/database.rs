//! Local development database lookup
//!
//! Reads the database name from a Rails-style `database.yml`. Both the flat
//! layout (`development.database`) and the multi-database layout
//! (`development.primary.database`) are accepted.

use crate::error::{ParityError, Result};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

const DATABASE_KEY: &str = "database";
const PRIMARY_KEY: &str = "primary";

/// Read the database name configured for `environment` in the YAML file at `path`
pub fn development_database(path: &Path, environment: &str) -> Result<String> {
    let error = |reason: String| ParityError::DatabaseConfig {
        path: path.to_path_buf(),
        reason,
    };

    let contents = fs::read_to_string(path).map_err(|e| error(e.to_string()))?;
    let mut document: Value =
        serde_yaml::from_str(&contents).map_err(|e| error(format!("invalid YAML: {e}")))?;
    document
        .apply_merge()
        .map_err(|e| error(format!("invalid YAML merge key: {e}")))?;

    let section = document
        .get(environment)
        .ok_or_else(|| error(format!("no `{environment}` section")))?;

    let name = section
        .get(PRIMARY_KEY)
        .and_then(|primary| primary.get(DATABASE_KEY))
        .or_else(|| section.get(DATABASE_KEY))
        .ok_or_else(|| {
            error(format!(
                "missing `{environment}.{DATABASE_KEY}` or `{environment}.{PRIMARY_KEY}.{DATABASE_KEY}`"
            ))
        })?;

    match name.as_str().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(error(format!(
            "`{DATABASE_KEY}` for `{environment}` must be a non-empty string"
        ))),
    }
}
