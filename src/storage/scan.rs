//! Directory walks that discover folders and note files.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use super::StorageError;

/// Folder names that never become projects.
pub const RESERVED_FOLDERS: &[&str] = &["assets", ".cache", "i", ".Trash"];

pub const TRASH_DIR: &str = ".Trash";
pub const ARCHIVE_DIR: &str = "Archive";

/// File extensions loaded as notes.
pub const NOTE_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Whether the last component of `path` is a reserved folder name.
pub fn is_reserved(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| RESERVED_FOLDERS.contains(&name))
}

pub fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| NOTE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Folders and notes found below a directory.
///
/// Owns everything it found so it can be produced on a worker thread and
/// applied later by the thread owning the library.
#[derive(Debug, Clone, Default)]
pub struct TreeScan {
    pub root: PathBuf,
    /// Sub-folders, parents before children.
    pub folders: Vec<PathBuf>,
    /// Note files with their content, the trash included.
    pub notes: Vec<(PathBuf, String)>,
}

impl TreeScan {
    /// Walks `root`, skipping hidden and reserved folders.
    ///
    /// Notes inside `root/.Trash` are collected as well so the trash row has
    /// content. Files that are not valid UTF-8 are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if `root` doesn't exist and
    /// `StorageError::NotADirectory` if it isn't a directory.
    pub fn run(root: &Path) -> Result<Self, StorageError> {
        if !root.exists() {
            return Err(StorageError::NotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(StorageError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let mut scan = TreeScan {
            root: root.to_path_buf(),
            ..TreeScan::default()
        };
        scan.walk(root, true);

        let trash = root.join(TRASH_DIR);
        if trash.is_dir() {
            scan.walk(&trash, false);
        }

        Ok(scan)
    }

    fn walk(&mut self, dir: &Path, record_folders: bool) {
        let walker = WalkDir::new(dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            if entry.file_type().is_dir() {
                if record_folders {
                    self.folders.push(entry.path().to_path_buf());
                }
            } else if entry.file_type().is_file() && is_note_file(entry.path()) {
                match std::fs::read_to_string(entry.path()) {
                    Ok(content) => self.notes.push((entry.path().to_path_buf(), content)),
                    Err(err) => warn!(path = %entry.path().display(), error = %err, "skipping note"),
                }
            }
        }
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return true;
    };
    name.starts_with('.') || (entry.file_type().is_dir() && RESERVED_FOLDERS.contains(&name))
}
