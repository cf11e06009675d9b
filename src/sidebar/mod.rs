//! The sidebar tree controller.
//!
//! [`Sidebar`] owns the tag forest and the root list, reads folders and notes
//! through a [`Storage`], and keeps an outline view in sync by flushing batches
//! of [`OutlineChange`]s after every operation.

mod drop;
mod jobs;
mod menu;
mod projects;
mod selection;
mod source;
mod tags;
mod view;

#[cfg(test)]
mod tests;

pub use drop::{DragOperation, DropPayload, DropPlan};
pub use jobs::{JobEvent, Jobs};
pub use menu::{MenuCommand, MenuItemState, ParseMenuCommandError};
pub use selection::{SelectionChange, SelectionTracker};
pub use source::{OutlineSource, Row, TreeSource};
pub use view::{
    Dialogs, FolderWatcher, MirrorMismatch, NotesView, OutlineChange, OutlineMirror, OutlineView,
    SidebarUi,
};

use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use crate::domain::{
    EntryId, EntryKind, IdCounter, NoteId, ProjectId, SidebarEntry, TagForest, TagPath,
};
use crate::storage::Storage;

/// Title of the header row above attached storage roots.
pub const EXTERNAL_HEADER: &str = "External Folders";

/// Behaviour switches read from the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidebarOptions {
    /// Rebuild the tag forest from the selected folders on every selection change.
    pub inline_tags: bool,
}

/// One slot of the fixed part of the root list.
enum Slot {
    Entry(EntryKind, String, Option<ProjectId>),
    Project(ProjectId),
}

/// The sidebar tree controller.
pub struct Sidebar<S: Storage, U: SidebarUi> {
    storage: S,
    ui: U,
    options: SidebarOptions,
    tags: TagForest,
    entries: Vec<SidebarEntry>,
    /// Entries and root-level folders, in display order. Tag roots follow.
    fixed: Vec<Row>,
    entry_ids: IdCounter,
    pending: Vec<OutlineChange>,
    selection: Vec<Row>,
    tracker: SelectionTracker,
    expanded_tags: BTreeSet<TagPath>,
    current_note: Option<NoteId>,
    skip_selection: bool,
    first_launch: bool,
    jobs: Jobs,
}

impl<S: Storage, U: SidebarUi> Sidebar<S, U> {
    /// Builds the root list, loads the tags and restores the last selection.
    pub fn new(storage: S, ui: U, options: SidebarOptions) -> Self {
        let mut sidebar = Self {
            storage,
            ui,
            options,
            tags: TagForest::new(),
            entries: Vec::new(),
            fixed: Vec::new(),
            entry_ids: IdCounter::default(),
            pending: Vec::new(),
            selection: Vec::new(),
            tracker: SelectionTracker::new(),
            expanded_tags: BTreeSet::new(),
            current_note: None,
            skip_selection: false,
            first_launch: true,
            jobs: Jobs::new(),
        };
        sidebar.rebuild_root_list();
        sidebar.pending.push(OutlineChange::ReloadedAll);
        sidebar.load_all_tags();
        sidebar.flush();
        sidebar.restore_selection();
        sidebar
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn options(&self) -> SidebarOptions {
        self.options
    }

    pub fn tags(&self) -> &TagForest {
        &self.tags
    }

    pub fn entries(&self) -> &[SidebarEntry] {
        &self.entries
    }

    /// Entries and root-level folders preceding the tag roots.
    pub fn fixed_rows(&self) -> &[Row] {
        &self.fixed
    }

    pub fn current_note(&self) -> Option<NoteId> {
        self.current_note
    }

    pub fn source(&self) -> TreeSource<'_> {
        TreeSource {
            library: self.storage.library(),
            tags: &self.tags,
            entries: &self.entries,
            fixed: &self.fixed,
        }
    }

    /// Sends buffered changes to the outline as one batch.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let changes = std::mem::take(&mut self.pending);
        let source = TreeSource {
            library: self.storage.library(),
            tags: &self.tags,
            entries: &self.entries,
            fixed: &self.fixed,
        };
        self.ui.apply(&changes, &source);
    }

    fn root_layout(&self) -> Vec<Slot> {
        let projects = &self.storage.library().projects;
        let default = projects.default_project();
        let mut slots = vec![
            Slot::Entry(EntryKind::All, EntryKind::All.title().to_string(), None),
            Slot::Entry(EntryKind::Inbox, EntryKind::Inbox.title().to_string(), default),
        ];

        if let Some(node) = default.and_then(|id| projects.get(id)) {
            let mut children: Vec<(String, ProjectId)> = node
                .children()
                .iter()
                .filter_map(|id| projects.get(*id))
                .map(|child| (child.label().to_lowercase(), child.id()))
                .collect();
            children.sort();
            slots.extend(children.into_iter().map(|(_, id)| Slot::Project(id)));
        }

        let trash = default.and_then(|id| projects.trash_of(id));
        let archive = default.and_then(|id| projects.archive_of(id));
        for (kind, project) in [
            (EntryKind::Todo, None),
            (EntryKind::Untagged, None),
            (EntryKind::Archive, archive),
            (EntryKind::Trash, trash),
        ] {
            slots.push(Slot::Entry(kind, kind.title().to_string(), project));
        }

        let external = self.storage.get_external_projects();
        if !external.is_empty() {
            slots.push(Slot::Entry(
                EntryKind::Header,
                EXTERNAL_HEADER.to_string(),
                None,
            ));
            slots.extend(external.into_iter().map(Slot::Project));
        }
        slots
    }

    /// Replaces entries and fixed rows wholesale. Emits nothing.
    fn rebuild_root_list(&mut self) {
        let slots = self.root_layout();
        self.entries.clear();
        self.fixed.clear();
        for slot in slots {
            match slot {
                Slot::Entry(kind, name, project) => {
                    let id = EntryId::from_raw(self.entry_ids.next());
                    self.entries.push(SidebarEntry::new(id, kind, name, project));
                    self.fixed.push(Row::Entry(id));
                }
                Slot::Project(id) => self.fixed.push(Row::Project(id)),
            }
        }
    }

    /// Rebuilds the root list from storage and reloads the whole outline.
    pub fn reload_sidebar(&mut self) {
        let previous = self
            .primary_row()
            .and_then(|row| self.visible_rows().iter().position(|r| *r == row));

        self.rebuild_root_list();
        self.selection.clear();
        self.tags.clear();
        self.pending.push(OutlineChange::ReloadedAll);
        self.load_all_tags();
        self.flush();

        let index = previous.unwrap_or(0);
        if !self.select_index(index) {
            self.select_index(0);
        }
        info!(rows = self.fixed.len(), tags = self.tags.len(), "sidebar reloaded");
    }

    /// Index a new root-level folder labelled `label` takes among the
    /// folders listed right after the inbox entry.
    pub fn root_project_position(&self, label: &str) -> usize {
        let projects = &self.storage.library().projects;
        let Some(inbox) = self
            .fixed
            .iter()
            .position(|row| self.entry_kind(*row) == Some(EntryKind::Inbox))
        else {
            return 0;
        };

        let key = label.to_lowercase();
        let mut index = inbox + 1;
        while let Some(Row::Project(id)) = self.fixed.get(index) {
            match projects.get(*id) {
                Some(node) if node.label().to_lowercase() < key => index += 1,
                _ => break,
            }
        }
        index
    }

    /// Root-level index a new tag root named `name` takes.
    pub fn root_tag_position(&self, name: &str) -> usize {
        self.fixed.len() + self.tags.root_position(name)
    }

    pub fn entry(&self, id: EntryId) -> Option<&SidebarEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    fn entry_kind(&self, row: Row) -> Option<EntryKind> {
        match row {
            Row::Entry(id) => self.entry(id).map(SidebarEntry::kind),
            _ => None,
        }
    }

    pub fn row_for_entry(&self, kind: EntryKind) -> Option<Row> {
        self.entries
            .iter()
            .find(|entry| entry.kind() == kind)
            .map(|entry| Row::Entry(entry.id()))
    }

    /// Row showing a folder: its own row, or the entry bound to it.
    pub fn row_for_project(&self, id: ProjectId) -> Option<Row> {
        if let Some(entry) = self.entries.iter().find(|entry| entry.project() == Some(id)) {
            return Some(Row::Entry(entry.id()));
        }
        let row = Row::Project(id);
        self.row_exists(row).then_some(row)
    }

    pub fn row_for_path(&self, path: &Path) -> Option<Row> {
        self.row_for_project(self.storage.get_by(path)?)
    }

    pub fn row_for_tag(&self, tag: &TagPath) -> Option<Row> {
        self.tags.find(tag).map(Row::Tag)
    }

    /// Folder a row stands for, directly or through an entry binding.
    pub fn project_of_row(&self, row: Row) -> Option<ProjectId> {
        match row {
            Row::Project(id) => Some(id),
            Row::Entry(id) => self.entry(id)?.project(),
            Row::Tag(_) => None,
        }
    }

    pub fn tag_path_of_row(&self, row: Row) -> Option<TagPath> {
        match row {
            Row::Tag(id) => self.tags.path_of(id),
            _ => None,
        }
    }

    /// Whether the row is currently part of the model tree.
    fn row_exists(&self, row: Row) -> bool {
        match row {
            Row::Entry(id) => self.entry(id).is_some(),
            Row::Tag(id) => self.tags.get(id).is_some(),
            Row::Project(id) => {
                if self.fixed.contains(&row) {
                    return true;
                }
                let projects = &self.storage.library().projects;
                match projects.get(id).and_then(|node| node.parent()) {
                    Some(parent) => projects
                        .get(parent)
                        .is_some_and(|p| p.children().contains(&id) && !p.is_default()),
                    None => false,
                }
            }
        }
    }

    /// Applies finished background jobs. Returns how many were applied.
    pub fn poll_jobs(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.jobs.try_next() {
            self.apply_job(event);
            applied += 1;
        }
        applied
    }

    /// Blocks until every background job has finished and was applied.
    pub fn wait_for_jobs(&mut self) {
        while let Some(event) = self.jobs.next_blocking() {
            self.apply_job(event);
        }
    }

    pub fn jobs_in_flight(&self) -> usize {
        self.jobs.in_flight()
    }

    fn apply_job(&mut self, event: JobEvent) {
        match event {
            JobEvent::Scanned { path, result } => {
                let registered = result.and_then(|scan| self.storage.register_scanned(scan, true));
                match registered {
                    Ok(id) => {
                        self.storage.state_mut().add_bookmark(&path);
                        if let Err(err) = self.storage.save_state() {
                            self.ui.alert(&err.to_string());
                        }
                        info!(path = %path.display(), project = %id, "storage attached");
                        self.reload_sidebar();
                    }
                    Err(err) => {
                        debug!(path = %path.display(), error = %err, "attach failed");
                        self.ui.alert(&err.to_string());
                    }
                }
            }
            JobEvent::Snapshot { root, result } => match result {
                Ok(target) => {
                    info!(root = %root.display(), target = %target.display(), "snapshot finished");
                }
                Err(err) => self.ui.alert(&err.to_string()),
            },
        }
    }
}
