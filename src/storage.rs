// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StorageError;
use crate::events::{EventSink, LibraryEvent};

/// Namespaced keys for every value the engine persists
pub mod keys {
    /// Favorited item ids, insertion order
    pub const FAVORITES: &str = "mediateca.favorites";
    /// Played item ids, insertion order
    pub const PLAYED: &str = "mediateca.played";
    /// Volume preference, 0.0 to 1.0
    pub const VOLUME: &str = "mediateca.volume";
    /// Id of the last active item
    pub const LAST_ITEM: &str = "mediateca.last_item";
    /// Playback position of the last active item, in seconds
    pub const LAST_POSITION: &str = "mediateca.last_position";
    /// Saved filter presets
    pub const FILTER_PRESETS: &str = "mediateca.filter_presets";
    /// View mode preference, "grid" or "list"
    pub const VIEW_MODE: &str = "mediateca.view_mode";
    /// Date of the last visit
    pub const LAST_VISIT: &str = "mediateca.last_visit";
}

/// Key-value persistence abstraction.
///
/// Values are JSON documents, mirroring the shape of browser local storage.
/// Writes are synchronous; implementations are expected to be cheap enough
/// to call on every mutation.
pub trait KeyValueStore {
    /// Read the raw JSON value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Store a raw JSON value under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Remove the value stored under `key`, if any
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Typed accessors layered over any [`KeyValueStore`]
pub trait StoreExt: KeyValueStore {
    /// Read and decode the value stored under `key`
    fn get_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key)? {
            Some(value) => {
                let decoded =
                    serde_json::from_value(value).map_err(|e| StorageError::DecodeFailed {
                        key: key.to_string(),
                        source: e,
                    })?;
                Ok(Some(decoded))
            }
            None => Ok(None),
        }
    }

    /// Encode and store `value` under `key`
    fn set_value<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_value(value).map_err(|e| StorageError::EncodeFailed {
            key: key.to_string(),
            source: e,
        })?;
        self.set(key, encoded)
    }
}

impl<S: KeyValueStore + ?Sized> StoreExt for S {}

/// Read a value, falling back to `fallback` when the key is absent or the
/// stored value cannot be decoded. Decode failures are reported through the
/// sink rather than propagated; a corrupt entry degrades to defaults.
pub fn read_or<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
    fallback: T,
    events: &dyn EventSink,
) -> T {
    match store.get_value(key) {
        Ok(Some(value)) => value,
        Ok(None) => fallback,
        Err(e) => {
            events.emit(LibraryEvent::StorageFailed {
                key: key.to_string(),
                error: e.to_string(),
            });
            fallback
        }
    }
}

/// Write a value, reporting failure through the sink instead of propagating.
///
/// Returns whether the write landed. Callers keep their in-memory state
/// either way; persistence failure degrades the session, it never aborts it.
pub fn write_or_report<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
    events: &dyn EventSink,
) -> bool {
    match store.set_value(key, value) {
        Ok(()) => true,
        Err(e) => {
            events.emit(LibraryEvent::StorageFailed {
                key: key.to_string(),
                error: e.to_string(),
            });
            false
        }
    }
}

/// In-memory store for tests and embedding hosts that persist elsewhere
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store holding all keys in one JSON document.
///
/// The whole document is rewritten on every set; entries are tens of small
/// values, so the synchronous write stays cheap.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl JsonFileStore {
    /// Open the store at `path`, reading the existing document if present
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = if path.exists() {
            let content =
                std::fs::read_to_string(&path).map_err(|e| StorageError::ReadFailed {
                    path: path.clone(),
                    source: e,
                })?;
            serde_json::from_str(&content).map_err(|e| StorageError::MalformedFile {
                path: path.clone(),
                source: e,
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectoryFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            StorageError::EncodeFailed {
                key: "state-document".to_string(),
                source: e,
            }
        })?;

        std::fs::write(&self.path, json).map_err(|e| StorageError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}
