//! Cold storage: one JSON record per id under a configured root directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::core::{HeapError, Result};
use crate::heap::item::HeapItemState;

/// Persisted unit for one heap id: the registry class name plus the memory
/// snapshot produced by `save_state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColdStorageRecord {
    pub class: String,
    pub memory: HeapItemState,
}

/// On-disk record store, keyed by id as `<root>/<id>.json`.
///
/// The root is not validated at construction; missing directories or
/// permission problems surface on the first read, write or listing. Reads and
/// writes are not retried.
pub struct ColdStore {
    root: PathBuf,
}

impl ColdStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    /// Reads the record for `id`, or `None` when no record exists.
    pub fn read(&self, id: &str) -> Result<Option<ColdStorageRecord>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        let record: ColdStorageRecord = serde_json::from_str(&raw)?;
        Ok(Some(record))
    }

    /// Writes or overwrites the record for `id`.
    ///
    /// The record is staged in a temp file next to its final location and
    /// moved into place with an atomic rename, so readers never observe a
    /// partially written record.
    pub fn write(&self, id: &str, record: &ColdStorageRecord) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let mut staged = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer(&mut staged, record)?;
        staged.flush()?;
        staged
            .persist(self.record_path(id))
            .map_err(|err| HeapError::Io(err.error))?;
        Ok(())
    }

    /// Point-in-time listing of persisted record names, in filesystem
    /// enumeration order. Names are reported as stored (e.g. `a.json`).
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}
