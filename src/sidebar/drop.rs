//! Drag and drop onto sidebar rows.

use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::{Row, Sidebar, SidebarUi};
use crate::domain::{NoteId, ProjectId, TagPath};
use crate::storage::{Storage, StorageError};

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    /// Notes from the note list.
    Notes(Vec<NoteId>),
    /// Files or directories from outside the library.
    Files(Vec<PathBuf>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOperation {
    Move,
    Copy,
}

/// The work a drop would do. Hover validation and acceptance share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPlan {
    TagNotes { tag: TagPath, notes: Vec<NoteId> },
    TrashNotes { notes: Vec<NoteId> },
    MoveNotes { project: ProjectId, notes: Vec<NoteId> },
    ImportFiles { project: ProjectId, files: Vec<PathBuf> },
}

impl DropPlan {
    pub fn operation(&self) -> DragOperation {
        match self {
            DropPlan::TagNotes { .. } | DropPlan::ImportFiles { .. } => DragOperation::Copy,
            DropPlan::TrashNotes { .. } | DropPlan::MoveNotes { .. } => DragOperation::Move,
        }
    }
}

impl<S: Storage, U: SidebarUi> Sidebar<S, U> {
    pub fn plan_drop(&self, row: Row, payload: &DropPayload) -> Option<DropPlan> {
        if let Row::Tag(_) = row {
            return match payload {
                DropPayload::Notes(notes) if !notes.is_empty() => Some(DropPlan::TagNotes {
                    tag: self.tag_path_of_row(row)?,
                    notes: notes.clone(),
                }),
                _ => None,
            };
        }

        let project = self.project_of_row(row)?;
        let node = self.storage.library().projects.get(project)?;
        match payload {
            DropPayload::Notes(notes) if notes.is_empty() => None,
            DropPayload::Notes(notes) if node.is_trash() => Some(DropPlan::TrashNotes {
                notes: notes.clone(),
            }),
            DropPayload::Notes(notes) => Some(DropPlan::MoveNotes {
                project,
                notes: notes.clone(),
            }),
            DropPayload::Files(files) if files.is_empty() => None,
            DropPayload::Files(files) => Some(DropPlan::ImportFiles {
                project,
                files: files.clone(),
            }),
        }
    }

    /// Operation a hover over `row` should advertise.
    pub fn validate_drop(&self, row: Row, payload: &DropPayload) -> Option<DragOperation> {
        self.plan_drop(row, payload).map(|plan| plan.operation())
    }

    pub fn accept_drop(&mut self, row: Row, payload: &DropPayload) -> bool {
        let Some(plan) = self.plan_drop(row, payload) else {
            debug!(?row, "drop rejected");
            return false;
        };
        match plan {
            DropPlan::TagNotes { tag, notes } => self.tag_notes(&tag, &notes) > 0,
            DropPlan::TrashNotes { notes } => self.trash_notes(&notes),
            DropPlan::MoveNotes { project, notes } => self.move_notes_to(project, &notes),
            DropPlan::ImportFiles { project, files } => self.import_files(project, &files),
        }
    }

    fn trash_notes(&mut self, notes: &[NoteId]) -> bool {
        // tags are captured first so a partial failure can still prune them
        let tagged: Vec<(NoteId, Vec<TagPath>)> = notes
            .iter()
            .filter_map(|id| self.storage.library().notes.get(*id))
            .map(|note| (note.id(), note.tags().to_vec()))
            .collect();
        let failure = self.storage.remove_notes(notes).err();

        let gone: Vec<(NoteId, Vec<TagPath>)> = tagged
            .into_iter()
            .filter(|(id, _)| self.storage.library().notes.get(*id).is_none())
            .collect();
        let ids: Vec<NoteId> = gone.iter().map(|(id, _)| *id).collect();
        if !ids.is_empty() {
            self.ui.remove_notes(&ids);
            let stale: Vec<TagPath> = gone.into_iter().flat_map(|(_, tags)| tags).collect();
            self.remove_tags_of(&stale);
        }
        info!(notes = ids.len(), "notes trashed");

        match failure {
            Some(err) => {
                warn!(error = %err, trashed = ids.len(), "trashing stopped early");
                self.ui.alert(&err.to_string());
                false
            }
            None => true,
        }
    }

    fn move_notes_to(&mut self, project: ProjectId, notes: &[NoteId]) -> bool {
        let failure = self.storage.move_notes(notes, project).err();
        for id in notes {
            if let Some(note) = self.storage.library().notes.get(*id) {
                if note.project() == project {
                    self.ui.reload_note(note);
                }
            }
        }
        // notes moved before a failure still changed folders
        self.reload_tags();
        let scoped = self.scoped_notes();
        self.ui.update_table(&scoped);

        match failure {
            Some(err) => {
                warn!(error = %err, project = %project, "moving notes stopped early");
                self.ui.alert(&err.to_string());
                false
            }
            None => {
                info!(project = %project, notes = notes.len(), "notes moved");
                true
            }
        }
    }

    fn import_files(&mut self, project: ProjectId, files: &[PathBuf]) -> bool {
        let mut imported = 0;
        for file in files {
            if file.is_dir() {
                match self.storage.copy_folder(file, project) {
                    Ok(copied) => {
                        if self.insert_project(&copied).is_some() {
                            imported += 1;
                        }
                    }
                    // a same-named folder is skipped, the rest still gets copied
                    Err(err @ StorageError::AlreadyExists { .. }) => {
                        debug!(path = %file.display(), "folder already exists");
                        self.ui.alert(&err.to_string());
                    }
                    Err(err) => self.ui.alert(&err.to_string()),
                }
                continue;
            }

            match self.storage.import_file(file, project) {
                Ok(note) => {
                    self.insert_tags(note);
                    imported += 1;
                }
                Err(err) => self.ui.alert(&err.to_string()),
            }
        }

        if imported > 0 {
            let scoped = self.scoped_notes();
            self.ui.update_table(&scoped);
        }
        info!(project = %project, imported, "files dropped");
        imported > 0
    }
}
