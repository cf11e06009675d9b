//! Collaborator traits of the sidebar and an in-memory outline.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::source::{OutlineSource, Row};
use crate::domain::{Note, NoteId};

/// An incremental outline update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineChange {
    /// `row` now sits at `index` under `parent`.
    Inserted {
        parent: Option<Row>,
        index: usize,
        row: Row,
    },
    /// The child at `index` under `parent` is gone.
    Removed { parent: Option<Row>, index: usize },
    /// Re-read the children of `row`.
    Reloaded { row: Row },
    /// Re-read everything.
    ReloadedAll,
}

/// The outline control.
pub trait OutlineView {
    /// Applies one batch of changes. `source` reflects the model after every
    /// change in the batch.
    fn apply(&mut self, changes: &[OutlineChange], source: &dyn OutlineSource);

    /// Shows the children of `row`.
    fn expand_row(&mut self, _row: Row, _source: &dyn OutlineSource) {}

    fn show_selection(&mut self, _rows: &[Row]) {}
}

/// The note list and editor next to the sidebar.
pub trait NotesView {
    fn reload_note(&mut self, note: &Note);

    fn remove_notes(&mut self, notes: &[NoteId]);

    fn reload_all(&mut self);

    /// Replaces the listed notes.
    fn update_table(&mut self, notes: &[NoteId]);

    fn clear_editor(&mut self);

    fn refill_editor(&mut self, note: &Note);

    fn clear_search(&mut self);
}

/// Blocking user dialogs.
pub trait Dialogs {
    fn confirm(&mut self, message: &str) -> bool;

    fn alert(&mut self, message: &str);

    fn reveal(&mut self, path: &Path);
}

/// Filesystem change observation.
pub trait FolderWatcher {
    fn reload_observed_folders(&mut self, folders: &[PathBuf]);

    fn unwatch(&mut self, folder: &Path);
}

/// Everything the sidebar talks to besides storage.
pub trait SidebarUi: OutlineView + NotesView + Dialogs + FolderWatcher {}

impl<T: OutlineView + NotesView + Dialogs + FolderWatcher> SidebarUi for T {}

/// Rows the mirror shows under a parent differ from the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("outline out of sync under {parent:?}: model has {expected:?}, outline shows {actual:?}")]
pub struct MirrorMismatch {
    pub parent: Option<Row>,
    pub expected: Vec<Row>,
    pub actual: Vec<Row>,
}

/// An outline that keeps its own lazily loaded copy of the tree.
///
/// Children of a row are only known once the row was expanded or reloaded.
/// Insertions into and removals from a parent whose children are not loaded
/// are ignored, and a reload is resolved against the source at the end of its
/// batch. Comparing the mirror with the model after each batch shows whether
/// the change stream alone keeps a native outline correct.
#[derive(Debug, Clone, Default)]
pub struct OutlineMirror {
    loaded: HashMap<Option<Row>, Vec<Row>>,
    selection: Vec<Row>,
    batches: usize,
}

impl OutlineMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, parent: Option<Row>) -> bool {
        self.loaded.contains_key(&parent)
    }

    /// Loaded children of `parent`.
    pub fn children(&self, parent: Option<Row>) -> Option<&[Row]> {
        self.loaded.get(&parent).map(Vec::as_slice)
    }

    pub fn selection(&self) -> &[Row] {
        &self.selection
    }

    /// Number of batches applied so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Loads every expandable row reachable from the root.
    pub fn expand_all(&mut self, source: &dyn OutlineSource) {
        let mut stack: Vec<Option<Row>> = vec![None];
        while let Some(parent) = stack.pop() {
            let children = self
                .loaded
                .entry(parent)
                .or_insert_with(|| source.children(parent))
                .clone();
            stack.extend(
                children
                    .into_iter()
                    .filter(|row| source.is_expandable(*row))
                    .map(Some),
            );
        }
    }

    /// Loaded rows depth-first with their depth.
    pub fn rows(&self) -> Vec<(usize, Row)> {
        let mut out = Vec::new();
        self.collect(None, 0, &mut out);
        out
    }

    fn collect(&self, parent: Option<Row>, depth: usize, out: &mut Vec<(usize, Row)>) {
        if let Some(children) = self.loaded.get(&parent) {
            for row in children {
                out.push((depth, *row));
                self.collect(Some(*row), depth + 1, out);
            }
        }
    }

    /// Checks every loaded level against the model.
    pub fn verify(&self, source: &dyn OutlineSource) -> Result<(), MirrorMismatch> {
        let mut stack: Vec<Option<Row>> = vec![None];
        while let Some(parent) = stack.pop() {
            let Some(actual) = self.loaded.get(&parent) else {
                continue;
            };
            let expected = source.children(parent);
            if *actual != expected {
                return Err(MirrorMismatch {
                    parent,
                    expected,
                    actual: actual.clone(),
                });
            }
            stack.extend(actual.iter().copied().map(Some));
        }
        Ok(())
    }

    fn unload(&mut self, row: Row) {
        let mut stack = vec![row];
        while let Some(cur) = stack.pop() {
            if let Some(children) = self.loaded.remove(&Some(cur)) {
                stack.extend(children);
            }
        }
    }

    fn is_reachable(&self, row: Row) -> bool {
        self.loaded.values().any(|children| children.contains(&row))
    }
}

impl OutlineView for OutlineMirror {
    fn apply(&mut self, changes: &[OutlineChange], source: &dyn OutlineSource) {
        let mut reload: BTreeSet<Option<Row>> = BTreeSet::new();

        for change in changes {
            match change {
                OutlineChange::Inserted { parent, index, row } => {
                    if let Some(children) = self.loaded.get_mut(parent) {
                        let at = (*index).min(children.len());
                        children.insert(at, *row);
                    }
                }
                OutlineChange::Removed { parent, index } => {
                    let removed = match self.loaded.get_mut(parent) {
                        Some(children) if *index < children.len() => Some(children.remove(*index)),
                        _ => None,
                    };
                    if let Some(row) = removed {
                        self.unload(row);
                    }
                }
                OutlineChange::Reloaded { row } => {
                    if self.is_loaded(Some(*row)) {
                        self.unload(*row);
                        reload.insert(Some(*row));
                    }
                }
                OutlineChange::ReloadedAll => {
                    self.loaded.clear();
                    reload.clear();
                    reload.insert(None);
                }
            }
        }

        for parent in reload {
            let present = match parent {
                None => true,
                Some(row) => self.is_reachable(row),
            };
            if present {
                self.loaded.insert(parent, source.children(parent));
            }
        }
        let loaded = &self.loaded;
        self.selection
            .retain(|row| loaded.values().any(|children| children.contains(row)));
        self.batches += 1;
    }

    fn expand_row(&mut self, row: Row, source: &dyn OutlineSource) {
        if !self.is_loaded(Some(row)) && self.is_reachable(row) {
            self.loaded.insert(Some(row), source.children(Some(row)));
        }
    }

    fn show_selection(&mut self, rows: &[Row]) {
        self.selection = rows.to_vec();
    }
}
