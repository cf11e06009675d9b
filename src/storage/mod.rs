//! Folder storage: the project forest, the note list, and the filesystem behind them.

mod fs;
mod scan;
mod snapshot;
mod state;

pub use fs::FsStorage;
pub use scan::{
    ARCHIVE_DIR, NOTE_EXTENSIONS, RESERVED_FOLDERS, TRASH_DIR, TreeScan, is_note_file, is_reserved,
};
pub use snapshot::{SNAPSHOT_DIR, take_snapshot};
pub use state::{STATE_DIR, SidebarState};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{Note, NoteId, NoteList, ProjectForest, ProjectId, ProjectNode};

/// Errors raised by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("atomic write failed for {path}: {source}")]
    AtomicWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid sidebar state in {path}: {source}")]
    State {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown project {0}")]
    UnknownProject(ProjectId),

    #[error("unknown note {0}")]
    UnknownNote(NoteId),

    #[error("background job for {path} stopped before finishing")]
    Interrupted { path: PathBuf },
}

impl StorageError {
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied { path: path.into() },
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists { path: path.into() },
            _ => StorageError::Io {
                path: path.into(),
                source: error,
            },
        }
    }
}

/// In-memory view of every attached storage tree.
#[derive(Debug, Clone, Default)]
pub struct Library {
    pub projects: ProjectForest,
    pub notes: NoteList,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a project, its descendants and every note stored in them.
    pub fn remove_project(&mut self, id: ProjectId) -> (Vec<ProjectNode>, Vec<Note>) {
        let removed = self.projects.remove(id);
        let ids: Vec<ProjectId> = removed.iter().map(ProjectNode::id).collect();
        let notes = self.notes.remove_in_projects(&ids);
        (removed, notes)
    }

    /// Projects whose notes appear under "All Notes".
    pub fn common_projects(&self) -> Vec<ProjectId> {
        self.projects
            .iter()
            .filter(|node| !node.is_trash() && !node.is_archive() && node.flags().show_in_common)
            .map(ProjectNode::id)
            .collect()
    }

    /// `ids` plus every folder nested under them, without duplicates.
    pub fn with_descendants(&self, ids: &[ProjectId]) -> Vec<ProjectId> {
        let mut scope: Vec<ProjectId> = Vec::new();
        for id in ids {
            if !scope.contains(id) {
                scope.push(*id);
            }
            for child in self.projects.descendants(*id) {
                if !scope.contains(&child) {
                    scope.push(child);
                }
            }
        }
        scope
    }
}

/// Storage collaborator of the sidebar.
///
/// Implementors own the [`Library`] and the persisted [`SidebarState`]. The
/// provided methods are the queries the sidebar makes; the required ones touch
/// the disk.
pub trait Storage {
    fn library(&self) -> &Library;

    fn library_mut(&mut self) -> &mut Library;

    fn state(&self) -> &SidebarState;

    fn state_mut(&mut self) -> &mut SidebarState;

    fn save_state(&self) -> Result<(), StorageError>;

    /// Registers every sub-folder of `project` not yet known. Returns the new ids.
    fn assign_tree(&mut self, project: ProjectId) -> Vec<ProjectId>;

    /// Loads the notes stored directly in `project`. Returns the new ids.
    fn fetch_notes(&mut self, project: ProjectId) -> Vec<NoteId>;

    /// Registers a scanned storage root with its trash and archive folders.
    fn register_scanned(&mut self, scan: TreeScan, external: bool)
    -> Result<ProjectId, StorageError>;

    /// Creates `name` inside `parent` and returns its path. Does not register it.
    fn create_folder(&mut self, parent: ProjectId, name: &str) -> Result<PathBuf, StorageError>;

    fn remove_folder(&mut self, path: &Path) -> Result<(), StorageError>;

    /// Renames a folder in place and returns its new path.
    fn rename_folder(&mut self, path: &Path, name: &str) -> Result<PathBuf, StorageError>;

    /// Copies an outside directory into `target`. Fails with
    /// [`StorageError::AlreadyExists`] when the name is taken.
    fn copy_folder(&mut self, source: &Path, target: ProjectId) -> Result<PathBuf, StorageError>;

    /// Copies an outside file into `target` and loads it as a note.
    fn import_file(&mut self, source: &Path, target: ProjectId) -> Result<NoteId, StorageError>;

    /// Moves note files into `target`. Stops at the first failure.
    fn move_notes(&mut self, notes: &[NoteId], target: ProjectId) -> Result<(), StorageError>;

    /// Moves note files into their storage root's trash and drops them from
    /// the note list. Notes already in a trash are deleted.
    fn remove_notes(&mut self, notes: &[NoteId]) -> Result<Vec<Note>, StorageError>;

    /// Writes a note's content back to its file.
    fn save_note(&mut self, note: NoteId) -> Result<(), StorageError>;

    fn register_root(&mut self, path: &Path, external: bool) -> Result<ProjectId, StorageError> {
        let scan = TreeScan::run(path)?;
        self.register_scanned(scan, external)
    }

    fn project_exist(&self, path: &Path) -> bool {
        self.library().projects.exists(path)
    }

    fn find_parent(&self, path: &Path) -> Option<ProjectId> {
        self.library().projects.find_parent(path)
    }

    fn get_by(&self, path: &Path) -> Option<ProjectId> {
        self.library().projects.get_by_path(path)
    }

    fn get_projects(&self) -> Vec<ProjectId> {
        self.library().projects.iter().map(ProjectNode::id).collect()
    }

    fn get_available_projects(&self) -> Vec<ProjectId> {
        self.library().common_projects()
    }

    /// External storage roots sorted case-insensitively by label.
    fn get_external_projects(&self) -> Vec<ProjectId> {
        let projects = &self.library().projects;
        let mut roots: Vec<&ProjectNode> = projects
            .roots()
            .iter()
            .filter_map(|id| projects.get(*id))
            .filter(|node| node.is_external())
            .collect();
        roots.sort_by_key(|node| node.label().to_lowercase());
        roots.into_iter().map(ProjectNode::id).collect()
    }

    fn remove_by(&mut self, project: ProjectId) -> (Vec<ProjectNode>, Vec<Note>) {
        self.library_mut().remove_project(project)
    }

    /// Copies the forest's expanded flags into the state and persists it.
    fn save_expand_state(&mut self) -> Result<(), StorageError> {
        let expanded = self.library().projects.expanded_paths();
        self.state_mut().expanded = expanded;
        self.save_state()
    }

    fn remove_bookmark(&mut self, path: &Path) -> Result<bool, StorageError> {
        let removed = self.state_mut().remove_bookmark(path);
        if removed {
            self.save_state()?;
        }
        Ok(removed)
    }
}
