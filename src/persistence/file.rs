//! JSON file backend
//!
//! All keys live in one JSON object. Writes go to a `.tmp` sibling first and
//! are renamed over the real file, so a crash mid-write leaves the previous
//! save intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{KvStore, StoreError};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. A corrupt file is reported so the
    /// caller can decide whether to start fresh.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::info!("Opened store {} ({} keys)", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Open, falling back to an empty store if the file is unreadable
    pub fn open_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::open(path).unwrap_or_else(|e| {
            log::warn!("Store {} unusable ({}), starting fresh", path.display(), e);
            Self {
                path: path.to_path_buf(),
                entries: BTreeMap::new(),
            }
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}
