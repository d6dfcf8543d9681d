use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading a catalog document
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog JSON: {0}")]
    ParseFailed(#[from] serde_json::Error),
}

/// Why a single raw catalog entry was rejected during load.
///
/// Validation failures are fatal to the entry only; the surrounding load
/// skips the entry and continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Entry {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("Entry {index} has an invalid media URL: {reason}")]
    InvalidMediaUrl { index: usize, reason: String },

    #[error("Entry {index} reuses id {id}")]
    DuplicateId { index: usize, id: u32 },
}

/// Errors that can occur reading or writing the persistent key-value store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read storage file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write storage file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create storage directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage file {path} is not a JSON object: {source}")]
    MalformedFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode stored value for key '{key}': {source}")]
    DecodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode value for key '{key}': {source}")]
    EncodeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors reported by the playback controller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("No item is loaded in the player")]
    NoItemLoaded,

    #[error("Item {id} is not in the catalog")]
    UnknownItem { id: u32 },

    #[error("The catalog has no items to navigate")]
    EmptyCatalog,
}

/// Errors for saved filter preset operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    #[error("No saved filter preset named '{name}'")]
    NotFound { name: String },
}
