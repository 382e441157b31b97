use std::path::PathBuf;

use thiserror::Error;

use crate::models::store::Store;

pub mod json;
pub mod migrations;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to load contract store from '{path}': {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from '{path}': {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to save contract store to '{path}': {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize contract store to JSON: {source}")]
    SerializeFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create backup at '{path}': {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to cleanup old backups in '{dir}': {source}")]
    CleanupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Contract store was written by a newer version of ctr (schema {0}). Upgrade ctr to open it."
    )]
    FutureVersion(u32),

    #[error("Contract store has unsupported schema {0}. No migration path is known.")]
    UnsupportedVersion(u32),

    #[error("Contract store is missing a readable schema version: {0}")]
    InvalidVersion(String),
}

/// Persistence for the whole contract store. A failed `save` must leave the
/// previous file in place.
pub trait Storage {
    fn load(&self) -> Result<Store, StorageError>;
    fn save(&self, store: &Store) -> Result<(), StorageError>;
}

#[cfg(test)]
pub mod memory {
    use std::cell::{Cell, RefCell};

    use super::*;

    /// Keeps the last saved store as JSON. `fail_saves` makes every save
    /// fail without touching the saved copy.
    #[derive(Default)]
    pub struct MemoryStorage {
        pub saved: RefCell<Option<String>>,
        pub fail_saves: Cell<bool>,
    }

    impl Storage for MemoryStorage {
        fn load(&self) -> Result<Store, StorageError> {
            match self.saved.borrow().as_deref() {
                Some(json) => serde_json::from_str(json).map_err(|e| StorageError::ParseFailed {
                    path: PathBuf::from("memory"),
                    source: e,
                }),
                None => Ok(Store::default()),
            }
        }

        fn save(&self, store: &Store) -> Result<(), StorageError> {
            if self.fail_saves.get() {
                return Err(StorageError::SaveFailed {
                    path: PathBuf::from("memory"),
                    source: std::io::Error::other("disk full"),
                });
            }
            let json = serde_json::to_string(store)
                .map_err(|e| StorageError::SerializeFailed { source: e })?;
            *self.saved.borrow_mut() = Some(json);
            Ok(())
        }
    }
}
