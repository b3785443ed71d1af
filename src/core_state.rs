//! Application state shared by every command.
//!
//! Owns the key-value store and the record store built on it. The record
//! store sits behind a `Mutex` because appends update its in-memory
//! sequences; this serializes calls within one process only, and separate
//! processes on the same storage still end in last-writer-wins.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::AppConfig;
use crate::records::RecordStore;
use crate::storage::{KeyValueStore, SqliteStore, StorageError};

pub type SharedStore = Arc<dyn KeyValueStore>;

pub struct AppState {
    pub config: AppConfig,
    kv: SharedStore,
    records: Mutex<RecordStore<SharedStore>>,
}

impl AppState {
    /// State over an already opened store.
    pub fn new(config: AppConfig, kv: SharedStore) -> Self {
        Self {
            config,
            records: Mutex::new(RecordStore::new(Arc::clone(&kv))),
            kv,
        }
    }

    /// Opens the SQLite store under `config.data_dir`.
    pub fn open(config: AppConfig) -> Result<Self, StorageError> {
        let kv: SharedStore = Arc::new(SqliteStore::open(&config.storage_path())?);
        tracing::info!(data_dir = %config.data_dir.display(), "Local storage ready");
        Ok(Self::new(config, kv))
    }

    pub fn kv(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    pub fn records(&self) -> Result<MutexGuard<'_, RecordStore<SharedStore>>, String> {
        self.records
            .lock()
            .map_err(|_| "Record store lock poisoned".to_string())
    }
}
