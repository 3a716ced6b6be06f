//! Error types for store operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not hold the expected JSON.
    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Another thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,

    /// A knowledge entry had an empty question or answer.
    #[error("knowledge entries need a non-empty question and answer")]
    EmptyEntry,
}
