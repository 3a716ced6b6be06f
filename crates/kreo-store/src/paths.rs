//! Path utilities for Kreo data directories.

use std::path::{Path, PathBuf};

use crate::{CHATS_FILE, KNOWLEDGE_FILE};

/// Default data directory (~/.kreo/), falling back to `./.kreo` when the
/// home directory cannot be determined.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".kreo"))
        .unwrap_or_else(|| PathBuf::from(".kreo"))
}

/// Path of the chat list inside `data_dir`.
pub fn chats_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CHATS_FILE)
}

/// Path of the knowledge list inside `data_dir`.
pub fn knowledge_path(data_dir: &Path) -> PathBuf {
    data_dir.join(KNOWLEDGE_FILE)
}

/// Ensure the data directory exists.
pub fn ensure_dir(data_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(data_dir)
}
