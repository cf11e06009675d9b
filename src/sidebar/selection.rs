//! Selection rules, change detection and the notes shown for a selection.

use tracing::{debug, warn};

use super::{OutlineSource, Row, Sidebar, SidebarUi};
use crate::domain::{EntryId, EntryKind, NoteId, ProjectId, TagPath};
use crate::storage::Storage;

/// Which parts of the selection differ from the previous evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub entries: bool,
    pub projects: bool,
    pub tags: bool,
}

impl SelectionChange {
    pub fn any(&self) -> bool {
        self.entries || self.projects || self.tags
    }
}

/// Remembers the previously observed selection.
///
/// Every evaluation overwrites the stored snapshot, so a change is always
/// relative to the immediately preceding call.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    entries: Option<Vec<EntryId>>,
    projects: Option<Vec<ProjectId>>,
    tags: Option<Vec<TagPath>>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &mut self,
        entries: Vec<EntryId>,
        projects: Vec<ProjectId>,
        tags: Vec<TagPath>,
    ) -> SelectionChange {
        SelectionChange {
            entries: changed(&mut self.entries, entries),
            projects: changed(&mut self.projects, projects),
            tags: changed(&mut self.tags, tags),
        }
    }

    /// Drops removed folders from the stored project snapshot.
    pub fn forget_projects(&mut self, removed: &[ProjectId]) {
        if let Some(projects) = self.projects.as_mut() {
            projects.retain(|id| !removed.contains(id));
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn changed<T: PartialEq>(previous: &mut Option<Vec<T>>, current: Vec<T>) -> bool {
    let differs = match previous.as_ref() {
        None => true,
        Some(prev) => prev.len() != current.len() || current.iter().any(|item| !prev.contains(item)),
    };
    *previous = Some(current);
    differs
}

impl<S: Storage, U: SidebarUi> Sidebar<S, U> {
    pub fn selection(&self) -> &[Row] {
        &self.selection
    }

    /// First selected row.
    pub fn primary_row(&self) -> Option<Row> {
        self.selection.first().copied()
    }

    pub fn is_selectable(&self, row: Row) -> bool {
        match row {
            Row::Entry(id) => self.entry(id).is_some_and(|entry| entry.is_selectable()),
            Row::Project(_) | Row::Tag(_) => self.row_exists(row),
        }
    }

    /// Selects `row`, replacing the selection unless `extend` is set.
    ///
    /// A tag row always extends the selection but replaces any other tag row.
    pub fn select(&mut self, row: Row, extend: bool) -> bool {
        if !self.is_selectable(row) {
            debug!(?row, "row is not selectable");
            return false;
        }

        let extend = match row {
            Row::Tag(_) => {
                self.selection.retain(|r| !matches!(r, Row::Tag(_)));
                true
            }
            _ => extend,
        };
        if !extend {
            self.selection.clear();
        }
        if !self.selection.contains(&row) {
            self.selection.push(row);
        }

        self.ui.show_selection(&self.selection);
        self.selection_did_change();
        true
    }

    pub fn deselect(&mut self, row: Row) -> bool {
        let before = self.selection.len();
        self.selection.retain(|r| *r != row);
        if before == self.selection.len() {
            return false;
        }
        self.ui.show_selection(&self.selection);
        self.selection_did_change();
        true
    }

    /// Selects the visible row at `index`.
    pub fn select_index(&mut self, index: usize) -> bool {
        match self.visible_rows().get(index).copied() {
            Some(row) => self.select(row, false),
            None => false,
        }
    }

    /// Whether the row's children are shown. Folder state is persisted, tag
    /// state only lives as long as the sidebar.
    pub fn is_expanded(&self, row: Row) -> bool {
        match row {
            Row::Entry(_) => false,
            Row::Project(id) => self
                .storage
                .library()
                .projects
                .get(id)
                .is_some_and(|node| node.is_expanded()),
            Row::Tag(id) => self
                .tags
                .path_of(id)
                .is_some_and(|path| self.expanded_tags.contains(&path)),
        }
    }

    /// Rows as an outline shows them with the current expansion state.
    pub fn visible_rows(&self) -> Vec<Row> {
        let source = self.source();
        let mut rows = Vec::new();
        let mut stack: Vec<Row> = source.children(None).into_iter().rev().collect();

        while let Some(row) = stack.pop() {
            rows.push(row);
            if self.is_expanded(row) {
                stack.extend(source.children(Some(row)).into_iter().rev());
            }
        }
        rows
    }

    /// Moves the selection to the next selectable visible row.
    pub fn select_next(&mut self) -> bool {
        self.step_selection(true)
    }

    /// Moves the selection to the previous selectable visible row.
    pub fn select_prev(&mut self) -> bool {
        self.step_selection(false)
    }

    fn step_selection(&mut self, forward: bool) -> bool {
        let rows = self.visible_rows();
        let current = self
            .primary_row()
            .and_then(|row| rows.iter().position(|r| *r == row));

        let candidates: Vec<Row> = match (current, forward) {
            (Some(i), true) => rows[i + 1..].to_vec(),
            (Some(i), false) => rows[..i].iter().rev().copied().collect(),
            (None, true) => rows.clone(),
            (None, false) => rows.iter().rev().copied().collect(),
        };
        match candidates.into_iter().find(|row| self.is_selectable(*row)) {
            Some(row) => self.select(row, false),
            None => false,
        }
    }

    pub fn select_entry(&mut self, kind: EntryKind) -> bool {
        match self.row_for_entry(kind) {
            Some(row) => self.select(row, false),
            None => false,
        }
    }

    /// Selects the entry bound to the default library root.
    pub fn select_default_root(&mut self) -> bool {
        self.select_entry(EntryKind::Inbox)
    }

    /// Selects the row of the note's folder and opens the note.
    pub fn select_note(&mut self, note: NoteId) -> bool {
        let Some(project) = self.storage.library().notes.get(note).map(|n| n.project()) else {
            return false;
        };
        let Some(row) = self.row_for_project(project) else {
            return false;
        };
        if !self.select(row, false) {
            return false;
        }
        self.current_note = Some(note);
        if let Some(note) = self.storage.library().notes.get(note) {
            self.ui.refill_editor(note);
        }
        true
    }

    /// Ignores the next selection change notification.
    pub fn skip_next_selection(&mut self) {
        self.skip_selection = true;
    }

    pub(super) fn restore_selection(&mut self) {
        let state = self.storage.state();
        let row = state
            .last_project
            .as_deref()
            .and_then(|path| self.row_for_path(path))
            .or_else(|| state.last_entry.and_then(|kind| self.row_for_entry(kind)))
            .or_else(|| self.row_for_entry(EntryKind::Inbox));

        let selected = row.is_some_and(|row| self.select(row, false));
        if !selected {
            self.select_index(0);
        }
    }

    fn selected_parts(&self) -> (Vec<EntryId>, Vec<ProjectId>, Vec<TagPath>) {
        let mut entries = Vec::new();
        let mut projects = Vec::new();
        let mut tags = Vec::new();
        for row in &self.selection {
            match row {
                Row::Entry(id) => entries.push(*id),
                Row::Project(id) => projects.push(*id),
                Row::Tag(id) => tags.extend(self.tags.path_of(*id)),
            }
        }
        (entries, projects, tags)
    }

    /// Selected tag paths.
    pub fn selected_tags(&self) -> Vec<TagPath> {
        self.selected_parts().2
    }

    /// Folder of the first non-tag selected row.
    pub fn selected_project(&self) -> Option<ProjectId> {
        self.selection
            .iter()
            .find_map(|row| self.project_of_row(*row))
    }

    /// Folders the tag forest is scoped to, or `None` for the whole library.
    pub(crate) fn tag_scope(&self) -> Option<Vec<ProjectId>> {
        if !self.options.inline_tags {
            return None;
        }
        let scope: Vec<ProjectId> = self
            .selection
            .iter()
            .filter(|row| self.entry_kind(**row) != Some(EntryKind::All))
            .filter_map(|row| self.project_of_row(*row))
            .collect();
        (!scope.is_empty()).then_some(scope)
    }

    /// Reacts to a new selection.
    pub fn selection_did_change(&mut self) {
        let (entries, projects, tags) = self.selected_parts();
        let change = self.tracker.evaluate(entries, projects, tags);

        if change.any() {
            self.ui.clear_editor();
            self.current_note = None;
        }

        let primary_is_tag = matches!(self.primary_row(), Some(Row::Tag(_)));
        if self.options.inline_tags && !primary_is_tag && (change.projects || change.entries) {
            self.load_all_tags();
            self.flush();
        }

        if change.entries || change.projects || self.first_launch {
            self.persist_selection();
        }
        if !self.first_launch {
            self.ui.clear_search();
        }
        self.first_launch = false;

        // snapshots above are always taken, only the table refresh is skipped
        if self.skip_selection {
            self.skip_selection = false;
            return;
        }
        let notes = self.scoped_notes();
        self.ui.update_table(&notes);
    }

    fn persist_selection(&mut self) {
        let primary = self.primary_row();
        let entry = primary.and_then(|row| self.entry_kind(row));
        let project = match primary {
            Some(Row::Project(id)) => self
                .storage
                .library()
                .projects
                .get(id)
                .map(|node| node.path().to_path_buf()),
            _ => None,
        };

        let state = self.storage.state_mut();
        if state.last_entry == entry && state.last_project == project {
            return;
        }
        state.last_entry = entry;
        state.last_project = project;
        if let Err(err) = self.storage.save_state() {
            warn!(error = %err, "failed to persist selection");
        }
    }

    /// Notes listed for the current selection.
    pub fn scoped_notes(&self) -> Vec<NoteId> {
        let library = self.storage.library();
        let common = library.common_projects();
        let mut scope: Vec<ProjectId> = Vec::new();
        let mut filters: Vec<EntryKind> = Vec::new();
        let mut has_scope = false;

        for row in &self.selection {
            match *row {
                Row::Tag(_) => {}
                Row::Project(id) => {
                    has_scope = true;
                    scope.extend(library.with_descendants(&[id]));
                }
                Row::Entry(id) => {
                    let Some(entry) = self.entry(id) else {
                        continue;
                    };
                    has_scope = true;
                    match (entry.kind(), entry.project()) {
                        (EntryKind::Header, _) => {}
                        (EntryKind::All, _) => scope.extend(common.iter().copied()),
                        (EntryKind::Todo | EntryKind::Untagged, _) => {
                            scope.extend(common.iter().copied());
                            filters.push(entry.kind());
                        }
                        (EntryKind::Label, Some(project)) => {
                            scope.extend(library.with_descendants(&[project]));
                        }
                        (_, Some(project)) => scope.push(project),
                        (_, None) => {}
                    }
                }
            }
        }
        if !has_scope {
            scope = common;
        }

        let tags = self.selected_tags();
        library
            .notes
            .in_projects(&scope)
            .filter(|note| {
                filters.iter().all(|kind| match kind {
                    EntryKind::Todo => note.content().contains("- [ ]"),
                    EntryKind::Untagged => note.tags().is_empty(),
                    _ => true,
                })
            })
            .filter(|note| tags.is_empty() || tags.iter().any(|tag| note.has_tag_under(tag)))
            .map(|note| note.id())
            .collect()
    }
}
