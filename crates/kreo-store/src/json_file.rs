//! A JSON list persisted to one file.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;

/// Backing file for a list of records. `None` keeps the list in memory only.
#[derive(Debug, Clone)]
pub(crate) struct JsonFile {
    path: Option<PathBuf>,
}

impl JsonFile {
    pub(crate) fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub(crate) fn memory() -> Self {
        Self { path: None }
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the list; a missing file is an empty list.
    pub(crate) fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, StoreError> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })
    }

    /// Write the whole list, replacing the file atomically.
    pub(crate) fn save<T: Serialize>(&self, items: &[T]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(items)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        debug!(path = %path.display(), count = items.len(), "store saved");
        Ok(())
    }
}
