//! Folder insertion, removal, expansion and the folder-level commands.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{OutlineChange, Row, Sidebar, SidebarUi};
use crate::domain::{EntryKind, NoteId, ProjectDraft, ProjectId, ProjectNode, TagPath};
use crate::storage::{Storage, is_reserved};

impl<S: Storage, U: SidebarUi> Sidebar<S, U> {
    fn all_project_paths(&self) -> Vec<PathBuf> {
        self.storage
            .library()
            .projects
            .iter()
            .map(|node| node.path().to_path_buf())
            .collect()
    }

    /// Registers the folder at `path` and shows it.
    ///
    /// Refused for known paths, reserved names, folders outside every storage
    /// root and folders inside a trash.
    pub fn insert_project(&mut self, path: &Path) -> Option<ProjectId> {
        if self.storage.project_exist(path) {
            debug!(path = %path.display(), "folder already registered");
            return None;
        }
        if is_reserved(path) {
            debug!(path = %path.display(), "reserved folder name");
            return None;
        }
        let Some(parent) = self.storage.find_parent(path) else {
            debug!(path = %path.display(), "folder outside every storage root");
            return None;
        };
        let (parent_is_default, parent_is_trash) = {
            let node = self.storage.library().projects.get(parent)?;
            (node.is_default(), node.is_trash())
        };
        if parent_is_trash {
            return None;
        }

        let id = self
            .storage
            .library_mut()
            .projects
            .insert(ProjectDraft::new(path), Some(parent))?;

        let mut loaded: Vec<NoteId> = self.storage.fetch_notes(id);
        for child in self.storage.assign_tree(id) {
            loaded.extend(self.storage.fetch_notes(child));
        }

        if parent_is_default {
            let label = self
                .storage
                .library()
                .projects
                .get(id)
                .map(|node| node.label().to_string())
                .unwrap_or_default();
            let index = self.root_project_position(&label);
            self.fixed.insert(index, Row::Project(id));
            self.pending.push(OutlineChange::Inserted {
                parent: None,
                index,
                row: Row::Project(id),
            });
        } else {
            let siblings = self
                .storage
                .library()
                .projects
                .get(parent)
                .map(|node| node.children().to_vec())
                .unwrap_or_default();
            let index = siblings.iter().position(|child| *child == id).unwrap_or(0);
            self.pending.push(OutlineChange::Inserted {
                parent: Some(Row::Project(parent)),
                index,
                row: Row::Project(id),
            });
            if siblings.len() == 1 {
                self.pending.push(OutlineChange::Reloaded {
                    row: Row::Project(parent),
                });
            }
        }

        for note in &loaded {
            self.insert_tags(*note);
        }
        let folders = self.all_project_paths();
        self.ui.reload_observed_folders(&folders);
        self.flush();

        info!(path = %path.display(), project = %id, notes = loaded.len(), "folder inserted");
        Some(id)
    }

    /// Forgets a folder, its sub-folders and their notes.
    ///
    /// Bookmarks of removed storage roots are dropped. The default library
    /// root cannot be removed.
    pub fn remove_project(&mut self, id: ProjectId) -> bool {
        let Some(node) = self.storage.library().projects.get(id).cloned() else {
            debug!(project = %id, "unknown folder");
            return false;
        };
        if node.is_default() || node.is_trash() || node.is_archive() {
            return false;
        }

        let removed_ids: Vec<ProjectId> = {
            let projects = &self.storage.library().projects;
            let mut ids = vec![id];
            ids.extend(projects.descendants(id));
            ids
        };
        let was_current = self
            .selection
            .iter()
            .filter_map(|row| self.project_of_row(*row))
            .any(|project| removed_ids.contains(&project));
        if was_current {
            self.ui.clear_editor();
            self.current_note = None;
        }

        match self.fixed.iter().position(|row| *row == Row::Project(id)) {
            Some(index) => {
                self.fixed.remove(index);
                self.pending.push(OutlineChange::Removed {
                    parent: None,
                    index,
                });
            }
            None => {
                let parent = node.parent();
                let index = parent
                    .and_then(|p| self.storage.library().projects.get(p))
                    .and_then(|p| p.children().iter().position(|child| *child == id));
                if let (Some(parent), Some(index)) = (parent, index) {
                    self.pending.push(OutlineChange::Removed {
                        parent: Some(Row::Project(parent)),
                        index,
                    });
                    self.pending.push(OutlineChange::Reloaded {
                        row: Row::Project(parent),
                    });
                }
            }
        }

        let (nodes, notes) = self.storage.remove_by(id);
        for removed in &nodes {
            self.ui.unwatch(removed.path());
            if removed.is_root() {
                if let Err(err) = self.storage.remove_bookmark(removed.path()) {
                    warn!(path = %removed.path().display(), error = %err, "failed to drop bookmark");
                }
            }
        }
        if nodes.iter().any(ProjectNode::is_expanded) {
            self.persist_expansion();
        }

        self.tracker.forget_projects(&removed_ids);
        self.selection.retain(|row| match row {
            Row::Project(project) => !removed_ids.contains(project),
            _ => true,
        });

        let note_ids: Vec<NoteId> = notes.iter().map(|note| note.id()).collect();
        if !note_ids.is_empty() {
            self.ui.remove_notes(&note_ids);
        }
        let stale: Vec<TagPath> = notes.iter().flat_map(|note| note.tags().to_vec()).collect();

        if self.storage.get_external_projects().is_empty() {
            self.drop_external_header();
        }
        self.remove_tags_of(&stale);
        self.flush();

        if was_current {
            self.select_index(0);
        }
        info!(path = %node.path().display(), folders = nodes.len(), notes = note_ids.len(), "folder removed");
        true
    }

    fn drop_external_header(&mut self) {
        let header = self
            .fixed
            .iter()
            .position(|row| self.entry_kind(*row) == Some(EntryKind::Header));
        if let Some(index) = header {
            if let Row::Entry(entry) = self.fixed.remove(index) {
                self.entries.retain(|e| e.id() != entry);
            }
            self.pending.push(OutlineChange::Removed {
                parent: None,
                index,
            });
        }
    }

    /// Creates a sub-folder on disk and shows it.
    pub fn create_project(&mut self, parent: ProjectId, name: &str) -> Option<ProjectId> {
        let flags = self.storage.library().projects.get(parent)?.flags();
        if flags.is_trash || flags.is_archive {
            return None;
        }
        match self.storage.create_folder(parent, name) {
            Ok(path) => self.insert_project(&path),
            Err(err) => {
                self.ui.alert(&err.to_string());
                None
            }
        }
    }

    /// Renames a folder on disk and re-registers it.
    pub fn rename_project(&mut self, id: ProjectId, name: &str) -> Option<ProjectId> {
        let node = self.storage.library().projects.get(id)?;
        if node.is_trash() || node.is_archive() || node.is_default() || node.is_root() {
            return None;
        }
        let old = node.path().to_path_buf();
        let expanded = node.is_expanded();

        let renamed = match self.storage.rename_folder(&old, name) {
            Ok(path) => path,
            Err(err) => {
                self.ui.alert(&err.to_string());
                return None;
            }
        };

        self.remove_project(id);
        let new_id = self.insert_project(&renamed)?;
        if expanded {
            self.expand(Row::Project(new_id));
        }
        if let Some(row) = self.row_for_project(new_id) {
            self.select(row, false);
        }
        Some(new_id)
    }

    /// Runs the delete command on the selection.
    ///
    /// Tags are stripped from notes, nested folders are deleted from disk and
    /// storage roots are detached. Each path asks for confirmation first.
    pub fn delete_selected(&mut self) -> bool {
        if !self.selected_tags().is_empty() {
            return self.delete_selected_tags();
        }
        let Some(id) = self.selected_project() else {
            return false;
        };
        let Some(node) = self.storage.library().projects.get(id).cloned() else {
            return false;
        };
        if node.is_trash() || node.is_archive() || node.is_default() {
            return false;
        }

        if node.is_root() {
            let message = format!("Detach storage \"{}\"?", node.label());
            if !self.ui.confirm(&message) {
                return false;
            }
            self.remove_project(id);
            self.select_index(0);
            self.ui.reload_all();
            return true;
        }

        let message = format!("Delete folder \"{}\" and its notes?", node.label());
        if !self.ui.confirm(&message) {
            return false;
        }
        if let Err(err) = self.storage.remove_folder(node.path()) {
            self.ui.alert(&err.to_string());
            return false;
        }
        self.remove_project(id)
    }

    /// Attaches an outside directory as an external storage root.
    ///
    /// The directory is scanned on a worker thread; the sidebar is rebuilt
    /// once [`Sidebar::poll_jobs`] applies the result.
    pub fn attach_storage(&mut self, path: &Path) -> bool {
        let path = match path.canonicalize() {
            Ok(path) => path,
            Err(err) => {
                self.ui.alert(&format!("{}: {err}", path.display()));
                return false;
            }
        };
        if self.storage.project_exist(&path) || self.storage.find_parent(&path).is_some() {
            debug!(path = %path.display(), "folder already part of a storage root");
            return false;
        }
        if !path.is_dir() {
            return false;
        }
        self.jobs.spawn_scan(path);
        true
    }

    /// Starts a snapshot of the selected folder's storage root.
    ///
    /// A second request while one is running is ignored.
    pub fn snapshot(&mut self) -> bool {
        let projects = &self.storage.library().projects;
        let target = self
            .selected_project()
            .or_else(|| projects.default_project())
            .and_then(|id| projects.storage_root_of(id))
            .and_then(|root| projects.get(root));
        let Some(root) = target else {
            return false;
        };
        if root.is_trash() {
            return false;
        }
        let path = root.path().to_path_buf();
        self.jobs.spawn_snapshot(path, Utc::now())
    }

    /// Shows the selected folder in the file manager.
    pub fn reveal(&mut self) -> bool {
        let Some(path) = self
            .selected_project()
            .and_then(|id| self.storage.library().projects.get(id))
            .map(|node| node.path().to_path_buf())
        else {
            return false;
        };
        self.ui.reveal(&path);
        true
    }

    pub fn expand(&mut self, row: Row) -> bool {
        self.set_row_expanded(row, true)
    }

    pub fn collapse(&mut self, row: Row) -> bool {
        self.set_row_expanded(row, false)
    }

    fn set_row_expanded(&mut self, row: Row, expanded: bool) -> bool {
        let changed = match row {
            Row::Entry(_) => false,
            Row::Project(id) => {
                let changed = self.storage.library_mut().projects.set_expanded(id, expanded);
                if changed {
                    self.persist_expansion();
                }
                changed
            }
            Row::Tag(id) => match self.tags.path_of(id) {
                Some(path) if expanded => self.expanded_tags.insert(path),
                Some(path) => self.expanded_tags.remove(&path),
                None => false,
            },
        };

        if expanded {
            self.flush();
            let source = super::TreeSource {
                library: self.storage.library(),
                tags: &self.tags,
                entries: &self.entries,
                fixed: &self.fixed,
            };
            self.ui.expand_row(row, &source);
        }
        changed
    }

    fn persist_expansion(&mut self) {
        if let Err(err) = self.storage.save_expand_state() {
            warn!(error = %err, "failed to persist expanded folders");
        }
    }
}
