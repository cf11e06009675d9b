//! Persisted sidebar preferences.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::StorageError;
use crate::domain::EntryKind;

/// Directory under the library root holding grove's own files.
pub const STATE_DIR: &str = ".grove";
const STATE_FILE: &str = "state.json";

/// Scalar preferences restored at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidebarState {
    /// Kind of the last selected entry.
    pub last_entry: Option<EntryKind>,
    /// Path of the last selected project.
    pub last_project: Option<PathBuf>,
    pub expanded: BTreeSet<PathBuf>,
    /// External storage roots attached by the user.
    pub bookmarks: Vec<PathBuf>,
}

impl SidebarState {
    pub fn path_in(root: &Path) -> PathBuf {
        root.join(STATE_DIR).join(STATE_FILE)
    }

    /// Reads the state file under `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self, StorageError> {
        let path = Self::path_in(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents =
            std::fs::read_to_string(&path).map_err(|e| StorageError::from_io(&path, e))?;
        serde_json::from_str(&contents).map_err(|e| StorageError::State { path, source: e })
    }

    /// Writes the state file atomically.
    pub fn save(&self, root: &Path) -> Result<(), StorageError> {
        let path = Self::path_in(root);
        let dir = root.join(STATE_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::from_io(&dir, e))?;

        let json = serde_json::to_string_pretty(self).map_err(|e| StorageError::State {
            path: path.clone(),
            source: e,
        })?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| StorageError::Io {
            path: path.clone(),
            source: e,
        })?;
        temp.write_all(json.as_bytes())
            .map_err(|e| StorageError::Io {
                path: path.clone(),
                source: e,
            })?;
        temp.persist(&path).map_err(|e| StorageError::AtomicWrite {
            path,
            source: e.error,
        })?;
        Ok(())
    }

    pub fn add_bookmark(&mut self, path: &Path) -> bool {
        if self.bookmarks.iter().any(|b| b == path) {
            return false;
        }
        self.bookmarks.push(path.to_path_buf());
        true
    }

    pub fn remove_bookmark(&mut self, path: &Path) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|b| b != path);
        before != self.bookmarks.len()
    }
}
