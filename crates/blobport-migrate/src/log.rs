//! The migration log.
//!
//! Append-only CSV, columns `id,file,collection,key`, no header row. The log
//! is the sole link between a migrated blob and its new location: the update
//! and removal phases replay it wholesale, so losing it makes them impossible
//! without re-scanning the sink.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use blobport_core::LogEntry;
use thiserror::Error;

/// Migration log errors
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to open migration log {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write migration log {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },

    #[error("failed to read migration log {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },
}

/// Buffered writer and wholesale reader for the migration log file.
///
/// Entries accumulate in memory via [`push`](Self::push) and hit disk on
/// [`flush`](Self::flush). The buffer is cleared only after a successful
/// flush; a failed flush leaves it intact, and a caller that never retries
/// loses those entries (the blobs themselves are already copied).
pub struct MigrationLog {
    path: PathBuf,
    buffer: Vec<LogEntry>,
}

impl MigrationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of buffered, not-yet-flushed entries.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.buffer.push(entry);
    }

    /// Append every buffered entry to the log file, then clear the buffer.
    /// Returns how many entries were written.
    pub fn flush(&mut self) -> Result<usize, LogError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LogError::Open {
                path: self.path.clone(),
                source,
            })?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for entry in &self.buffer {
            writer.serialize(entry).map_err(|source| LogError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        writer.flush().map_err(|source| LogError::Write {
            path: self.path.clone(),
            source: source.into(),
        })?;

        let written = self.buffer.len();
        self.buffer.clear();
        Ok(written)
    }

    /// Read the whole log back, in file order. A missing or malformed file is
    /// a hard error: the update and removal phases cannot run without it.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<LogEntry>, LogError> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|source| LogError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut entries = Vec::new();
        for row in reader.deserialize() {
            let entry: LogEntry = row.map_err(|source| LogError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
