//! Filesystem-backed storage with atomic note writes.

use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::scan::{ARCHIVE_DIR, TRASH_DIR, TreeScan, is_note_file, is_reserved};
use super::state::SidebarState;
use super::{Library, Storage, StorageError};
use crate::domain::{Note, NoteId, ProjectDraft, ProjectFlags, ProjectId};

/// Storage rooted at a notes directory, plus any bookmarked external roots.
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
    library: Library,
    state: SidebarState,
}

impl FsStorage {
    /// Opens the library rooted at `root`.
    ///
    /// Creates the trash and archive folders when missing, reattaches
    /// bookmarked roots that still exist and restores expanded folders.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` / `NotADirectory` for a bad root and
    /// `StorageError::State` when the persisted state cannot be parsed.
    pub fn open(root: &Path) -> Result<Self, StorageError> {
        let root = root
            .canonicalize()
            .map_err(|e| StorageError::from_io(root, e))?;
        let state = SidebarState::load(&root)?;

        let mut storage = Self {
            root: root.clone(),
            library: Library::new(),
            state,
        };
        storage.register_root(&root, false)?;

        for bookmark in storage.state.bookmarks.clone() {
            if !bookmark.is_dir() {
                warn!(path = %bookmark.display(), "bookmarked folder is gone");
                continue;
            }
            if let Err(err) = storage.register_root(&bookmark, true) {
                warn!(path = %bookmark.display(), error = %err, "failed to reattach folder");
            }
        }

        for path in storage.state.expanded.clone() {
            if let Some(id) = storage.library.projects.get_by_path(&path) {
                storage.library.projects.set_expanded(id, true);
            }
        }

        info!(
            root = %storage.root.display(),
            projects = storage.library.projects.len(),
            notes = storage.library.notes.len(),
            "library opened"
        );
        Ok(storage)
    }

    /// The default library root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_path(&self, id: ProjectId) -> Result<PathBuf, StorageError> {
        self.library
            .projects
            .get(id)
            .map(|node| node.path().to_path_buf())
            .ok_or(StorageError::UnknownProject(id))
    }

    fn note_path(&self, id: NoteId) -> Result<PathBuf, StorageError> {
        self.library
            .notes
            .get(id)
            .map(|note| note.path().to_path_buf())
            .ok_or(StorageError::UnknownNote(id))
    }

    /// Registers folders under their deepest known parent. Returns new ids.
    fn register_folders(&mut self, folders: &[PathBuf]) -> Vec<ProjectId> {
        let mut created = Vec::new();
        for folder in folders {
            if self.library.projects.exists(folder) || is_reserved(folder) {
                continue;
            }
            let parent = self.library.projects.find_parent(folder);
            if let Some(id) = self
                .library
                .projects
                .insert(ProjectDraft::new(folder.clone()), parent)
            {
                created.push(id);
            }
        }

        let mut touched: Vec<ProjectId> = created
            .iter()
            .filter_map(|id| self.library.projects.get(*id).and_then(|node| node.parent()))
            .collect();
        touched.extend(created.iter().copied());
        touched.sort();
        touched.dedup();
        for id in touched {
            self.library.projects.sort_children(id);
        }
        created
    }

    fn load_note(&mut self, path: PathBuf, content: String) -> Option<NoteId> {
        let project = self.library.projects.find_parent(&path)?;
        self.library.notes.push(path, project, content)
    }

    fn special_folder(
        &mut self,
        root: ProjectId,
        path: PathBuf,
        flags: ProjectFlags,
    ) -> Result<(), StorageError> {
        std::fs::create_dir_all(&path).map_err(|e| StorageError::from_io(&path, e))?;
        self.library
            .projects
            .insert(ProjectDraft::new(path).with_flags(flags), Some(root));
        Ok(())
    }
}

impl Storage for FsStorage {
    fn library(&self) -> &Library {
        &self.library
    }

    fn library_mut(&mut self) -> &mut Library {
        &mut self.library
    }

    fn state(&self) -> &SidebarState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SidebarState {
        &mut self.state
    }

    fn save_state(&self) -> Result<(), StorageError> {
        self.state.save(&self.root)
    }

    fn assign_tree(&mut self, project: ProjectId) -> Vec<ProjectId> {
        let Ok(path) = self.project_path(project) else {
            return Vec::new();
        };
        match TreeScan::run(&path) {
            Ok(scan) => self.register_folders(&scan.folders),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to scan folder");
                Vec::new()
            }
        }
    }

    fn fetch_notes(&mut self, project: ProjectId) -> Vec<NoteId> {
        let Ok(path) = self.project_path(project) else {
            return Vec::new();
        };
        let entries = match std::fs::read_dir(&path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to list folder");
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && is_note_file(p))
            .collect();
        files.sort();

        files
            .into_iter()
            .filter_map(|file| {
                let content = std::fs::read_to_string(&file).ok()?;
                self.library.notes.push(file, project, content)
            })
            .collect()
    }

    fn register_scanned(
        &mut self,
        scan: TreeScan,
        external: bool,
    ) -> Result<ProjectId, StorageError> {
        if self.library.projects.exists(&scan.root) {
            return Err(StorageError::AlreadyExists { path: scan.root });
        }

        let flags = ProjectFlags {
            is_root: true,
            is_external: external,
            is_default: !external && self.library.projects.default_project().is_none(),
            show_in_common: true,
            ..ProjectFlags::default()
        };
        let root = self
            .library
            .projects
            .insert(ProjectDraft::new(scan.root.clone()).with_flags(flags), None)
            .ok_or_else(|| StorageError::AlreadyExists {
                path: scan.root.clone(),
            })?;

        self.special_folder(
            root,
            scan.root.join(TRASH_DIR),
            ProjectFlags {
                is_trash: true,
                ..ProjectFlags::default()
            },
        )?;
        let archive = scan.root.join(ARCHIVE_DIR);
        self.special_folder(
            root,
            archive.clone(),
            ProjectFlags {
                is_archive: true,
                ..ProjectFlags::default()
            },
        )?;

        let folders: Vec<PathBuf> = scan
            .folders
            .into_iter()
            .filter(|folder| *folder != archive)
            .collect();
        let created = self.register_folders(&folders);
        self.library.projects.sort_children(root);

        let mut loaded = 0usize;
        for (path, content) in scan.notes {
            if self.load_note(path, content).is_some() {
                loaded += 1;
            }
        }

        debug!(
            root = %scan.root.display(),
            external,
            folders = created.len(),
            notes = loaded,
            "storage root registered"
        );
        Ok(root)
    }

    fn create_folder(&mut self, parent: ProjectId, name: &str) -> Result<PathBuf, StorageError> {
        let path = self.project_path(parent)?.join(name);
        if path.exists() {
            return Err(StorageError::AlreadyExists { path });
        }
        std::fs::create_dir(&path).map_err(|e| StorageError::from_io(&path, e))?;
        Ok(path)
    }

    fn remove_folder(&mut self, path: &Path) -> Result<(), StorageError> {
        std::fs::remove_dir_all(path).map_err(|e| StorageError::from_io(path, e))
    }

    fn rename_folder(&mut self, path: &Path, name: &str) -> Result<PathBuf, StorageError> {
        let parent = path.parent().ok_or_else(|| StorageError::NotFound {
            path: path.to_path_buf(),
        })?;
        let target = parent.join(name);
        if target.exists() {
            return Err(StorageError::AlreadyExists { path: target });
        }
        std::fs::rename(path, &target).map_err(|e| StorageError::from_io(path, e))?;
        Ok(target)
    }

    fn copy_folder(&mut self, source: &Path, target: ProjectId) -> Result<PathBuf, StorageError> {
        let name = source.file_name().ok_or_else(|| StorageError::NotFound {
            path: source.to_path_buf(),
        })?;
        let dest = self.project_path(target)?.join(name);
        if dest.exists() {
            return Err(StorageError::AlreadyExists { path: dest });
        }
        copy_tree(source, &dest, |_| false)?;
        Ok(dest)
    }

    fn import_file(&mut self, source: &Path, target: ProjectId) -> Result<NoteId, StorageError> {
        let name = source.file_name().ok_or_else(|| StorageError::NotFound {
            path: source.to_path_buf(),
        })?;
        let dest = self.project_path(target)?.join(name);
        if dest.exists() {
            return Err(StorageError::AlreadyExists { path: dest });
        }
        std::fs::copy(source, &dest).map_err(|e| StorageError::from_io(source, e))?;
        let content = std::fs::read_to_string(&dest).map_err(|e| StorageError::from_io(&dest, e))?;
        self.library
            .notes
            .push(dest.clone(), target, content)
            .ok_or(StorageError::AlreadyExists { path: dest })
    }

    fn move_notes(&mut self, notes: &[NoteId], target: ProjectId) -> Result<(), StorageError> {
        let dir = self.project_path(target)?;
        for id in notes {
            let from = self.note_path(*id)?;
            let Some(name) = from.file_name() else {
                continue;
            };
            let to = dir.join(name);
            if to == from {
                continue;
            }
            if to.exists() {
                return Err(StorageError::AlreadyExists { path: to });
            }
            std::fs::rename(&from, &to).map_err(|e| StorageError::from_io(&from, e))?;
            if let Some(note) = self.library.notes.get_mut(*id) {
                note.relocate(target, to);
            }
        }
        Ok(())
    }

    fn remove_notes(&mut self, notes: &[NoteId]) -> Result<Vec<Note>, StorageError> {
        let mut removed = Vec::new();
        for id in notes {
            let note = self
                .library
                .notes
                .get(*id)
                .ok_or(StorageError::UnknownNote(*id))?;
            let from = note.path().to_path_buf();
            let projects = &self.library.projects;
            let in_trash = projects.get(note.project()).is_some_and(|p| p.is_trash());
            let trash_dir = projects
                .storage_root_of(note.project())
                .and_then(|root| projects.trash_of(root))
                .and_then(|trash| projects.get(trash))
                .map(|trash| trash.path().to_path_buf());

            match (in_trash, trash_dir, from.file_name()) {
                (false, Some(trash), Some(name)) => {
                    let to = unique_path(&trash.join(name));
                    std::fs::rename(&from, &to).map_err(|e| StorageError::from_io(&from, e))?;
                }
                _ => {
                    std::fs::remove_file(&from).map_err(|e| StorageError::from_io(&from, e))?;
                }
            }

            if let Some(note) = self.library.notes.remove(*id) {
                removed.push(note);
            }
        }
        Ok(removed)
    }

    fn save_note(&mut self, id: NoteId) -> Result<(), StorageError> {
        let note = self.library.notes.get(id).ok_or(StorageError::UnknownNote(id))?;
        write_atomic(note.path(), note.content())
    }
}

/// Writes `content` to `path` through a temporary file in the same directory.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), StorageError> {
    let parent = path.parent().ok_or_else(|| StorageError::NotFound {
        path: path.to_path_buf(),
    })?;
    if !parent.exists() {
        return Err(StorageError::NotFound {
            path: parent.to_path_buf(),
        });
    }

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| StorageError::Io {
        path: path.into(),
        source: e,
    })?;
    temp.write_all(content.as_bytes())
        .map_err(|e| StorageError::Io {
            path: path.into(),
            source: e,
        })?;
    temp.persist(path).map_err(|e| StorageError::AtomicWrite {
        path: path.into(),
        source: e.error,
    })?;
    Ok(())
}

/// Recursively copies `source` into `dest`, pruning entries `skip` accepts.
///
/// Returns the number of files copied.
pub(crate) fn copy_tree(
    source: &Path,
    dest: &Path,
    skip: impl Fn(&DirEntry) -> bool,
) -> Result<usize, StorageError> {
    std::fs::create_dir_all(dest).map_err(|e| StorageError::from_io(dest, e))?;

    let mut files = 0;
    for entry in WalkDir::new(source)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !skip(e))
    {
        let entry = entry.map_err(|e| StorageError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| StorageError::from_io(&target, e))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)
                .map_err(|e| StorageError::from_io(entry.path(), e))?;
            files += 1;
        }
    }
    Ok(files)
}

/// Appends ` 2`, ` 3`, ... to the file stem until the path is free.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or(Path::new(""));
    (2..)
        .map(|n| parent.join(format!("{stem} {n}{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
