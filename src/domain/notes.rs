//! The global flat list of notes.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::ids::{IdCounter, NoteId, ProjectId};
use super::note::Note;
use super::tag_path::TagPath;

/// Every note known to the library, in load order.
#[derive(Debug, Clone, Default)]
pub struct NoteList {
    notes: Vec<Note>,
    ids: IdCounter,
}

impl NoteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id() == id)
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| note.id() == id)
    }

    /// Looks a note up by its file path.
    pub fn get_by_path(&self, path: &Path) -> Option<NoteId> {
        self.notes
            .iter()
            .find(|note| note.path() == path)
            .map(Note::id)
    }

    /// Adds a note unless one is already loaded from `path`.
    pub fn push(
        &mut self,
        path: impl Into<PathBuf>,
        project: ProjectId,
        content: impl Into<String>,
    ) -> Option<NoteId> {
        let path = path.into();
        if self.get_by_path(&path).is_some() {
            return None;
        }
        let id = NoteId::from_raw(self.ids.next());
        self.notes.push(Note::new(id, path, project, content));
        Some(id)
    }

    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        let index = self.notes.iter().position(|note| note.id() == id)?;
        Some(self.notes.remove(index))
    }

    /// Drops every note stored in one of `projects`.
    pub fn remove_in_projects(&mut self, projects: &[ProjectId]) -> Vec<Note> {
        let (removed, kept) = std::mem::take(&mut self.notes)
            .into_iter()
            .partition(|note| projects.contains(&note.project()));
        self.notes = kept;
        removed
    }

    pub fn in_projects<'a>(&'a self, projects: &'a [ProjectId]) -> impl Iterator<Item = &'a Note> {
        self.notes
            .iter()
            .filter(move |note| projects.contains(&note.project()))
    }

    /// Ids of notes carrying `tag` or a tag nested under it.
    pub fn tagged_with(&self, tag: &TagPath) -> Vec<NoteId> {
        self.notes
            .iter()
            .filter(|note| note.has_tag_under(tag))
            .map(Note::id)
            .collect()
    }

    /// Union of every note's tags.
    pub fn live_tags(&self) -> BTreeSet<TagPath> {
        self.notes
            .iter()
            .flat_map(|note| note.tags().iter().cloned())
            .collect()
    }

    /// Union of the tags of notes stored in `projects`.
    pub fn tags_in(&self, projects: &[ProjectId]) -> BTreeSet<TagPath> {
        self.in_projects(projects)
            .flat_map(|note| note.tags().iter().cloned())
            .collect()
    }
}
