//! Lock store backed by a file in the shared folder.

use super::{LockStore, Quarantined};
use crate::error::Result;
use crate::fs;
use crate::record::LockRecord;
use std::path::{Path, PathBuf};

/// The lock file on the shared folder.
#[derive(Debug, Clone)]
pub struct FileLockStore {
    path: PathBuf,
}

impl FileLockStore {
    /// Create a store for the lock file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockStore for FileLockStore {
    fn read(&self) -> Result<Option<LockRecord>> {
        match fs::read_optional(&self.path)? {
            Some(content) => LockRecord::from_json(&content).map(Some),
            None => Ok(None),
        }
    }

    fn write(&self, record: &LockRecord) -> Result<()> {
        let json = record.to_json()?;
        fs::atomic_write(&self.path, json.as_bytes())
    }

    fn create_if_absent(&self, record: &LockRecord) -> Result<()> {
        let json = record.to_json()?;
        fs::create_exclusive(&self.path, json.as_bytes())
    }

    fn remove(&self) -> Result<()> {
        fs::remove_if_exists(&self.path)
    }

    fn quarantine(&self) -> Result<Quarantined> {
        // Judge what is there now, not what an earlier read saw.
        let Some(seen) = fs::read_optional(&self.path)? else {
            return Ok(Quarantined::Nothing);
        };
        if LockRecord::from_json(&seen).is_ok() {
            return Ok(Quarantined::Valid);
        }

        let Some((aside, moved)) = fs::quarantine(&self.path)? else {
            return Ok(Quarantined::Nothing);
        };
        let moved = String::from_utf8_lossy(&moved);

        if moved.as_ref() != seen.as_str()
            && let Ok(record) = LockRecord::from_json(&moved)
        {
            // Replaced between the check and the rename: the caller restores it.
            let _ = fs::remove_if_exists(&aside);
            return Ok(Quarantined::Record(record));
        }

        tracing::warn!(
            lock = %self.path.display(),
            kept_at = %aside.display(),
            "moved corrupt lock record aside"
        );
        Ok(Quarantined::Corrupt)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
