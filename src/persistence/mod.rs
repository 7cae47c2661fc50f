//! Key-value persistence
//!
//! The core only needs `get`/`set` of strings. Failures are reported as
//! `StoreError`, and every caller in the core treats an error as "no value".
//!
//! Backends:
//! - `MemoryStore`: in-process map (tests, headless runs)
//! - `JsonFileStore`: one JSON object on disk (native)
//! - `platform::web::LocalStorageStore`: browser LocalStorage (wasm32)

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(not(target_arch = "wasm32"))]
pub use file::JsonFileStore;

use std::collections::BTreeMap;

use thiserror::Error;

/// Storage failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage is not available")]
    Unavailable,
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage rejected the write: {0}")]
    Rejected(String),
}

/// String key-value store
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store backed by a map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read a key, logging and swallowing failures
pub fn get_or_none(store: &dyn KvStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("failed to read `{}`: {}", key, e);
            None
        }
    }
}
