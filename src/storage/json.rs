use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use serde_json::{Value, to_string_pretty};
use uuid::Uuid;

use crate::{
    models::store::{CURRENT_VERSION, Store},
    storage::{
        Storage, StorageError,
        migrations::{apply_migrations, detect_version},
    },
};

/// Backups kept next to the store, oldest pruned first
const MAX_BACKUPS: usize = 5;

/// Contract store kept as one pretty-printed JSON file.
///
/// Saves write a temp file, take an exclusive lock on `<store>.lock`, copy the
/// current file into `backups/` and rename the temp file over the store. The
/// old file stays in place until the rename succeeds.
pub struct JsonFileStorage {
    path: PathBuf,
}

/// Held for the duration of a save; unlocks on drop.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release contract store lock");
        }
    }
}

impl JsonFileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn lock(&self) -> Result<StoreLock, StorageError> {
        let lock_path = self.path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StorageError::SaveFailed {
                path: lock_path.clone(),
                source: e,
            })?;
        file.lock_exclusive().map_err(|e| StorageError::SaveFailed {
            path: lock_path,
            source: e,
        })?;
        Ok(StoreLock { file })
    }

    fn backup_dir(&self) -> PathBuf {
        self.path
            .parent()
            .unwrap_or(Path::new("."))
            .join("backups")
    }

    /// `<file name>-<UTC timestamp>`; the fixed-width timestamp keeps name
    /// order equal to age order.
    fn backup_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "contracts.json".to_string());
        let stamp = jiff::Timestamp::now().strftime("%Y%m%dT%H%M%S%.6fZ");

        self.backup_dir().join(format!("{}-{}", file_name, stamp))
    }

    /// Copies the current store into the backup directory. Nothing to do
    /// before the first save.
    fn backup(&self) -> Result<(), StorageError> {
        let exists = fs::exists(&self.path).map_err(|e| StorageError::BackupFailed {
            path: self.path.clone(),
            source: e,
        })?;
        if !exists {
            return Ok(());
        }

        let dir = self.backup_dir();
        fs::create_dir_all(&dir).map_err(|e| StorageError::BackupFailed {
            path: dir,
            source: e,
        })?;

        let backup_path = self.backup_path();
        fs::copy(&self.path, &backup_path).map_err(|e| StorageError::BackupFailed {
            path: backup_path,
            source: e,
        })?;
        Ok(())
    }

    fn prune_backups(&self) -> Result<(), StorageError> {
        let dir = self.backup_dir();
        let cleanup_error = |e| StorageError::CleanupFailed {
            dir: dir.clone(),
            source: e,
        };

        if !fs::exists(&dir).map_err(cleanup_error)? {
            return Ok(());
        }

        let mut backups = fs::read_dir(&dir)
            .map_err(cleanup_error)?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect::<Vec<_>>();
        backups.sort();

        let excess = backups.len().saturating_sub(MAX_BACKUPS);
        for path in &backups[..excess] {
            fs::remove_file(path).map_err(cleanup_error)?;
            tracing::debug!(path = %path.display(), "pruned old backup");
        }

        Ok(())
    }

    /// Upgrades an older schema in memory; the file is rewritten on the next save.
    fn decode(&self, content: &str) -> Result<Store, StorageError> {
        let version = detect_version(content)?;
        if version > CURRENT_VERSION {
            return Err(StorageError::FutureVersion(version));
        }

        let parse_error = |e| StorageError::ParseFailed {
            path: self.path.clone(),
            source: e,
        };
        let mut data: Value = serde_json::from_str(content).map_err(parse_error)?;

        if version < CURRENT_VERSION {
            tracing::info!(from = version, to = CURRENT_VERSION, "migrating contract store");
            data = apply_migrations(data, version, CURRENT_VERSION)?;
        }
        if let Some(obj) = data.as_object_mut() {
            obj.insert("version".to_string(), Value::from(CURRENT_VERSION));
        }

        serde_json::from_value(data).map_err(parse_error)
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Store, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Store::default()),
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let store = self.decode(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            contracts = store.contracts.len(),
            "loaded contract store"
        );
        Ok(store)
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        let json =
            to_string_pretty(store).map_err(|e| StorageError::SerializeFailed { source: e })?;

        let temp_path = PathBuf::from(format!("{}.tmp.{}", self.path.display(), Uuid::new_v4()));
        fs::write(&temp_path, json).map_err(|e| StorageError::SaveFailed {
            path: temp_path.clone(),
            source: e,
        })?;

        let result = self.lock().and_then(|_lock| {
            self.backup()?;
            self.prune_backups()?;
            fs::rename(&temp_path, &self.path).map_err(|e| StorageError::SaveFailed {
                path: self.path.clone(),
                source: e,
            })
        });

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        } else {
            tracing::debug!(
                path = %self.path.display(),
                contracts = store.contracts.len(),
                "saved contract store"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::{
        contract::{Contract, ContractStatus},
        draft::ContractDraft,
        store::CURRENT_VERSION,
    };
    use crate::render::Provider;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ctr_{}_{}", name, Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_save_and_load() {
        let dir = scratch_dir("save_load");
        let mut draft = ContractDraft::default();
        draft.client.name = String::from("Jane Doe");
        let contract = Contract::issue(
            draft,
            Provider::default(),
            String::from("CTR-TEST-ABCDE"),
            String::from("<html></html>"),
            String::from("https://sign.example.com/CTR-TEST-ABCDE"),
            jiff::Timestamp::now(),
        );
        let store = Store {
            version: CURRENT_VERSION,
            contracts: Vec::from([contract]),
        };
        let storage = JsonFileStorage::new(dir.join("contracts.json"));

        if storage.save(&store).is_err() {
            panic!("Should correctly save the store");
        }
        match storage.load() {
            Ok(loaded_store) => {
                assert_eq!(loaded_store.contracts, store.contracts);
                assert_eq!(loaded_store.contracts[0].status, ContractStatus::Draft);
            }
            Err(_) => panic!("Should correctly load the saved store"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_empty_store() {
        let dir = scratch_dir("missing");
        let storage = JsonFileStorage::new(dir.join("contracts.json"));

        let store = storage.load().unwrap();
        assert!(store.contracts.is_empty());
        assert_eq!(store.version, CURRENT_VERSION);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = scratch_dir("invalid");
        let path = dir.join("contracts.json");
        fs::write(&path, "{ this is not valid json }").unwrap();

        let storage = JsonFileStorage::new(path);

        match storage.load() {
            Err(StorageError::ParseFailed { .. }) => {}
            _ => panic!("Expected ParseFailed error, got something else"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_v1_without_version_field() {
        let dir = scratch_dir("v1");
        let path = dir.join("contracts.json");
        fs::write(&path, r#"{ "contracts": [] }"#).unwrap();

        let storage = JsonFileStorage::new(path);

        match storage.load() {
            Ok(store) => assert_eq!(store.version, CURRENT_VERSION),
            Err(e) => panic!("Expected successful load, got error: {:?}", e),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_contract_without_provider_uses_default() {
        let dir = scratch_dir("no_provider");
        let path = dir.join("contracts.json");
        let contract = Contract::issue(
            ContractDraft::default(),
            Provider::default(),
            String::from("CTR-TEST-ABCDE"),
            String::new(),
            String::new(),
            jiff::Timestamp::UNIX_EPOCH,
        );
        let mut value = serde_json::to_value(&contract).unwrap();
        value.as_object_mut().unwrap().remove("provider");
        let json = serde_json::json!({ "version": CURRENT_VERSION, "contracts": [value] });
        fs::write(&path, json.to_string()).unwrap();

        let store = JsonFileStorage::new(path).load().unwrap();
        assert_eq!(store.contracts[0].provider, Provider::default());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_future_version() {
        let dir = scratch_dir("future");
        let path = dir.join("contracts.json");
        fs::write(&path, r#"{ "version": 999, "contracts": [] }"#).unwrap();

        let storage = JsonFileStorage::new(path);

        match storage.load() {
            Err(StorageError::FutureVersion(999)) => {}
            _ => panic!("Expected FutureVersion(999) error"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_backup_creation_and_cleanup() {
        let dir = scratch_dir("backups");
        let storage = JsonFileStorage::new(dir.join("contracts.json"));

        for _ in 0..7 {
            storage.save(&Store::default()).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let backup_count = fs::read_dir(dir.join("backups"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .count();

        assert_eq!(backup_count, MAX_BACKUPS, "Should keep exactly 5 backups");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_backup_directory_created_on_second_save() {
        let dir = scratch_dir("backup_dir");
        let storage = JsonFileStorage::new(dir.join("contracts.json"));
        let backups_dir = dir.join("backups");

        storage.save(&Store::default()).unwrap();
        assert!(
            !backups_dir.exists(),
            "Backups dir should not exist after first save"
        );

        storage.save(&Store::default()).unwrap();
        assert!(
            backups_dir.is_dir(),
            "Backups dir should be created on second save"
        );

        fs::remove_dir_all(&dir).unwrap();
    }
}
