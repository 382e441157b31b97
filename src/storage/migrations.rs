use std::path::PathBuf;

use serde_json::Value;

use crate::storage::StorageError;

type MigrationFn = fn(Value) -> Result<Value, StorageError>;

/// Index `n` upgrades schema `n + 1` to `n + 2`. Empty while v1 is the only
/// schema.
const MIGRATIONS: &[MigrationFn] = &[];

/// Stores written before the schema was versioned have no `version` key and
/// count as v1.
pub fn detect_version(content: &str) -> Result<u32, StorageError> {
    let value: Value = serde_json::from_str(content).map_err(|e| StorageError::ParseFailed {
        path: PathBuf::from("<unknown>"),
        source: e,
    })?;

    match value.get("version") {
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| StorageError::InvalidVersion(v.to_string())),
        None => Ok(1),
    }
}

/// Runs every migration between the two versions in order.
pub fn apply_migrations(
    data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    if from_version > to_version {
        return Err(StorageError::FutureVersion(from_version));
    }

    (from_version..to_version).try_fold(data, |data, version| {
        let migrate = version
            .checked_sub(1)
            .and_then(|index| MIGRATIONS.get(index as usize))
            .ok_or(StorageError::UnsupportedVersion(version))?;
        migrate(data)
    })
}
