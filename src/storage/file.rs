//! Local JSON-file backend.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::StateSnapshot;
use crate::storage::StateBackend;
use crate::{Error, Result};

/// Stores the snapshot as pretty-printed JSON in a single file.
///
/// Writes go through a temporary file in the same directory followed by a
/// rename, so readers never observe a half-written snapshot.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Backend rooted at an explicit file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Backend at the default XDG data location
    /// (`~/.local/share/weekbank/state.json`).
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| Error::Config("could not determine data directory".to_string()))?;
        Ok(base.join("weekbank").join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateBackend for FileBackend {
    fn load(&self) -> Result<Option<StateSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::StoreUnavailable(format!("read {}: {}", self.path.display(), e)))?;
        let snapshot = serde_json::from_str(&content).map_err(|e| {
            Error::StoreUnavailable(format!("parse {}: {}", self.path.display(), e))
        })?;
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::StoreWriteFailure("state path has no parent".to_string()))?;
        fs::create_dir_all(parent)
            .map_err(|e| Error::StoreWriteFailure(format!("create {}: {}", parent.display(), e)))?;

        let content = serde_json::to_string_pretty(snapshot)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| Error::StoreWriteFailure(format!("temp file: {}", e)))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| Error::StoreWriteFailure(format!("write: {}", e)))?;
        tmp.persist(&self.path)
            .map_err(|e| Error::StoreWriteFailure(format!("rename: {}", e)))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}
