// src/system/storage.rs

//! File-backed [`Storage`]: a bincode history log plus the session's access
//! level and input mode.

use crate::constants::{CONFIG_DIR_NAME, HISTORY_FILENAME, HISTORY_LIMIT};
use crate::system::collaborators::Storage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing the history file.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A filesystem I/O error occurred.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The history file is not valid bincode.
    #[error("Failed to decode from binary format: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),
    /// The history could not be encoded.
    #[error("Failed to encode to binary format: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),
    /// No per-user configuration directory exists on this system.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
}

type StorageResult<T> = Result<T, StorageError>;

/// On-disk layout of the history file.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
struct HistoryRecord {
    entries: Vec<String>,
}

/// Default location of the history file (`<config dir>/termline/history.bin`).
pub fn default_history_path() -> StorageResult<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or(StorageError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);
    Ok(dir.join(HISTORY_FILENAME))
}

/// Reads a history file. A missing file is an empty history.
pub fn load_history(path: &Path) -> StorageResult<Vec<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let (record, _): (HistoryRecord, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(record.entries)
}

/// Writes a history file, creating its directory if needed.
///
/// The bytes go to a sibling temporary file first and replace the target with a
/// rename, so a failed write never truncates the existing history.
pub fn save_history(path: &Path, entries: &[String]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let record = HistoryRecord {
        entries: entries.to_vec(),
    };
    let bytes = bincode::serde::encode_to_vec(&record, bincode::config::standard())?;

    let temp_path = path.with_extension("bin.tmp");
    let temp_guard = scopeguard::guard(temp_path, |temp_path| {
        if let Err(e) = fs::remove_file(&temp_path) {
            log::trace!("No temporary history file to remove: {}", e);
        }
    });
    fs::write(&*temp_guard, bytes)?;
    fs::rename(&*temp_guard, path)?;
    // Renamed away: nothing left to clean up.
    scopeguard::ScopeGuard::into_inner(temp_guard);
    Ok(())
}

/// History and session facts for the console host.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: Option<PathBuf>,
    entries: Vec<String>,
    access_level: u32,
    mode: String,
}

impl FileStorage {
    /// Opens the history at `path`. An unreadable file is reported and replaced
    /// by an empty history on the next write.
    pub fn open(path: PathBuf, access_level: u32, mode: impl Into<String>) -> Self {
        let entries = match load_history(&path) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!(
                    "{}",
                    format!(
                        t!("storage.history_unavailable"),
                        path = path.display(),
                        error = e
                    )
                );
                Vec::new()
            }
        };
        log::debug!("Loaded {} history entries from {}", entries.len(), path.display());
        Self {
            path: Some(path),
            entries,
            access_level,
            mode: mode.into(),
        }
    }

    /// A storage that never touches the filesystem.
    pub fn in_memory(access_level: u32, mode: impl Into<String>) -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            access_level,
            mode: mode.into(),
        }
    }

    /// Where the history is persisted, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Storage for FileStorage {
    fn history(&self) -> Vec<String> {
        self.entries.clone()
    }

    fn append_history(&mut self, line: &str) -> anyhow::Result<()> {
        self.entries.push(line.to_string());
        let excess = self.entries.len().saturating_sub(HISTORY_LIMIT);
        if excess > 0 {
            self.entries.drain(..excess);
        }
        if let Some(path) = &self.path {
            save_history(path, &self.entries)?;
        }
        Ok(())
    }

    fn access_level(&self) -> u32 {
        self.access_level
    }

    fn mode(&self) -> String {
        self.mode.clone()
    }
}
