//! Tag forest maintenance driven by note changes.

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{OutlineChange, Row, Sidebar, SidebarUi};
use crate::domain::{NoteId, ProjectId, TagPath, TagRemoval, plan_rename};
use crate::storage::Storage;

impl<S: Storage, U: SidebarUi> Sidebar<S, U> {
    /// Union of the tags of notes stored in `scope` (with sub-folders).
    ///
    /// Without a scope, every folder shown under "All Notes" counts.
    pub fn get_all_tags(&self, scope: Option<&[ProjectId]>) -> BTreeSet<TagPath> {
        let library = self.storage.library();
        let projects = match scope {
            Some(ids) if !ids.is_empty() => library.with_descendants(ids),
            _ => library.common_projects(),
        };
        library.notes.tags_in(&projects)
    }

    /// Tags the forest currently has to show.
    fn visible_tags(&self) -> BTreeSet<TagPath> {
        let scope = self.tag_scope();
        self.get_all_tags(scope.as_deref())
    }

    fn push_tag_removal(&mut self, removal: TagRemoval) {
        let index = match removal.parent {
            None => self.fixed.len() + removal.index,
            Some(_) => removal.index,
        };
        self.pending.push(OutlineChange::Removed {
            parent: removal.parent.map(Row::Tag),
            index,
        });
        let forest = &self.tags;
        self.selection.retain(|row| match row {
            Row::Tag(id) => forest.get(*id).is_some(),
            _ => true,
        });
    }

    /// Adds one path to the forest and buffers the row insertion.
    fn add_tag_row(&mut self, path: &TagPath) {
        let addition = self.tags.add(path);
        if let Some(inserted) = addition.inserted {
            let index = match inserted.parent {
                None => self.fixed.len() + inserted.index,
                Some(_) => inserted.index,
            };
            self.pending.push(OutlineChange::Inserted {
                parent: inserted.parent.map(Row::Tag),
                index,
                row: Row::Tag(inserted.id),
            });
        }
    }

    /// Adds tags, optionally dropping every existing tag first.
    pub fn add_tags(&mut self, paths: &[TagPath], unload_old: bool) {
        if unload_old {
            self.unload_all_tags();
        }
        for path in paths {
            self.add_tag_row(path);
        }
        self.flush();
    }

    /// Removes tags no note in scope references any more.
    pub fn remove_tags(&mut self, paths: &[TagPath]) {
        let live = self.visible_tags();
        for path in paths {
            let removals = self.tags.remove(path, &live);
            if removals.is_empty() {
                debug!(tag = %path, "tag still referenced, keeping it");
            }
            for removal in removals {
                self.push_tag_removal(removal);
            }
        }
        let forest = &self.tags;
        self.expanded_tags.retain(|tag| forest.contains(tag));
        self.flush();
    }

    /// Drops every tag row.
    pub fn unload_all_tags(&mut self) {
        for removal in self.tags.clear() {
            self.push_tag_removal(removal);
        }
    }

    /// Rebuilds the forest from the tags in scope.
    pub fn load_all_tags(&mut self) {
        let selected = self.selected_tags();
        self.unload_all_tags();
        for path in self.visible_tags() {
            self.add_tag_row(&path);
        }
        for path in selected {
            if let Some(id) = self.tags.find(&path) {
                self.selection.push(Row::Tag(id));
            }
        }
        let forest = &self.tags;
        self.expanded_tags.retain(|tag| forest.contains(tag));
    }

    /// Rebuilds the forest when tags follow the selection.
    pub fn reload_tags(&mut self) {
        if self.options.inline_tags {
            self.load_all_tags();
            self.flush();
        }
    }

    /// Adds the tags of a new or changed note when they are in scope.
    pub fn insert_tags(&mut self, note: NoteId) {
        let Some(tags) = self
            .storage
            .library()
            .notes
            .get(note)
            .map(|n| n.tags().to_vec())
        else {
            return;
        };
        let visible = self.visible_tags();
        for tag in tags.iter().filter(|tag| visible.contains(*tag)) {
            self.add_tag_row(tag);
        }
        self.flush();
    }

    /// Prunes the given tags of removed or edited notes.
    pub fn remove_tags_of(&mut self, tags: &[TagPath]) {
        let mut unique: Vec<TagPath> = tags.to_vec();
        unique.sort();
        unique.dedup();
        // deepest first so parents are pruned after their children
        unique.sort_by_key(|tag| std::cmp::Reverse(tag.depth()));
        self.remove_tags(&unique);
    }

    /// Tags `notes` with `tag`, saves them and shows the tag row.
    pub fn tag_notes(&mut self, tag: &TagPath, notes: &[NoteId]) -> usize {
        let mut tagged = 0;
        for id in notes {
            let added = match self.storage.library_mut().notes.get_mut(*id) {
                Some(note) => {
                    let added = note.add_tag(tag);
                    note.scan_content_tags();
                    added
                }
                None => false,
            };
            if !added {
                continue;
            }
            if self.save_and_reload(*id) {
                tagged += 1;
            }
        }

        if tagged > 0 && self.visible_tags().contains(tag) {
            self.add_tag_row(tag);
        }
        self.flush();
        tagged
    }

    /// Strips `#tag` from `notes` and prunes the row once nothing uses it.
    pub fn untag_notes(&mut self, tag: &TagPath, notes: &[NoteId]) -> usize {
        let mut untagged = 0;
        for id in notes {
            let removed = match self.storage.library_mut().notes.get_mut(*id) {
                Some(note) => {
                    let removed = note.delete_tag(tag);
                    note.scan_content_tags();
                    removed
                }
                None => false,
            };
            if removed && self.save_and_reload(*id) {
                untagged += 1;
            }
        }

        if untagged > 0 {
            self.remove_tags_of(std::slice::from_ref(tag));
        }
        untagged
    }

    /// Writes a note back to disk and refreshes its row in the note list.
    fn save_and_reload(&mut self, id: NoteId) -> bool {
        if let Err(err) = self.storage.save_note(id) {
            self.ui.alert(&err.to_string());
            return false;
        }
        if let Some(note) = self.storage.library().notes.get(id) {
            self.ui.reload_note(note);
        }
        true
    }

    /// Renames `old` tags to `new` across the forest and every note.
    pub fn rename_tag(&mut self, old: &[TagPath], new: &TagPath) -> bool {
        if old.is_empty() || old.iter().all(|path| path == new) {
            return false;
        }

        let live = self.visible_tags();
        let plan = plan_rename(old, new, &live);

        let affected: Vec<NoteId> = self
            .storage
            .library()
            .notes
            .iter()
            .filter(|note| old.iter().any(|path| note.has_tag_under(path)))
            .map(|note| note.id())
            .collect();

        for id in &affected {
            if let Some(note) = self.storage.library_mut().notes.get_mut(*id) {
                for path in old {
                    note.replace_tag(path, new);
                    note.forget_tag(path);
                }
                note.scan_content_tags();
            }
            self.save_and_reload(*id);
        }

        let mut roots: Vec<&str> = plan.delete.iter().map(TagPath::root_name).collect();
        roots.sort_unstable();
        roots.dedup();
        for root in roots {
            if let Some(removal) = self.tags.remove_root(root) {
                self.push_tag_removal(removal);
            }
        }
        let visible = self.visible_tags();
        for path in plan.insert.iter().filter(|path| visible.contains(*path)) {
            self.add_tag_row(path);
        }
        let forest = &self.tags;
        self.expanded_tags.retain(|tag| forest.contains(tag));
        self.flush();

        if let Some(id) = self.tags.find(new) {
            self.selection.retain(|row| !matches!(row, Row::Tag(_)));
            self.selection.push(Row::Tag(id));
            self.ui.show_selection(&self.selection);
        }

        info!(to = %new, notes = affected.len(), "tags renamed");
        true
    }

    /// Strips the selected tags and everything nested under them from every
    /// note, after confirmation.
    pub fn delete_selected_tags(&mut self) -> bool {
        let selected = self.selected_tags();
        if selected.is_empty() {
            return false;
        }

        let affected: Vec<NoteId> = self
            .storage
            .library()
            .notes
            .iter()
            .filter(|note| selected.iter().any(|tag| note.has_tag_under(tag)))
            .map(|note| note.id())
            .collect();

        let names: Vec<String> = selected.iter().map(TagPath::to_inline).collect();
        let message = format!(
            "Remove {} from {} note(s)?",
            names.join(", "),
            affected.len()
        );
        if !self.ui.confirm(&message) {
            return false;
        }

        for id in &affected {
            if let Some(note) = self.storage.library_mut().notes.get_mut(*id) {
                let doomed: Vec<TagPath> = note
                    .tags()
                    .iter()
                    .filter(|own| selected.iter().any(|tag| tag.covers(own)))
                    .cloned()
                    .collect();
                for tag in &doomed {
                    note.delete_tag(tag);
                }
                note.scan_content_tags();
            }
            self.save_and_reload(*id);
        }

        self.remove_tags(&selected);
        self.ui.show_selection(&self.selection);
        self.selection_did_change();
        info!(tags = names.len(), notes = affected.len(), "tags deleted");
        true
    }

    /// Expands the ancestors of `path` and selects its row.
    pub fn select_tag(&mut self, path: &TagPath) -> bool {
        let Some(id) = self.tags.find(path) else {
            return false;
        };
        for ancestor in path.ancestors() {
            if let Some(row) = self.row_for_tag(&ancestor) {
                self.expand(row);
            }
        }
        self.select(Row::Tag(id), false)
    }

    /// Selected tags as inline tokens, e.g. `"#a #b/c "`.
    pub fn selected_inline_tags(&self) -> String {
        self.selected_tags()
            .iter()
            .map(|tag| format!("{} ", tag.to_inline()))
            .collect()
    }
}
