//! Outline rows and the data source the view reads them through.

use serde::Serialize;

use crate::domain::{EntryId, ProjectId, SidebarEntry, TagForest, TagId};
use crate::storage::Library;

/// A position in the outline: a virtual entry, a folder, or a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Row {
    Entry(EntryId),
    Project(ProjectId),
    Tag(TagId),
}

/// Three-method tree data source, plus labels.
///
/// `None` stands for the invisible outline root.
pub trait OutlineSource {
    fn child_count(&self, parent: Option<Row>) -> usize;

    fn child(&self, parent: Option<Row>, index: usize) -> Option<Row>;

    fn is_expandable(&self, row: Row) -> bool;

    fn label(&self, row: Row) -> String;

    fn children(&self, parent: Option<Row>) -> Vec<Row> {
        (0..self.child_count(parent))
            .filter_map(|index| self.child(parent, index))
            .collect()
    }
}

/// Read-only view over the sidebar model.
///
/// The root level is the fixed rows followed by the tag roots.
#[derive(Clone, Copy)]
pub struct TreeSource<'a> {
    pub(crate) library: &'a Library,
    pub(crate) tags: &'a TagForest,
    pub(crate) entries: &'a [SidebarEntry],
    pub(crate) fixed: &'a [Row],
}

impl<'a> TreeSource<'a> {
    pub fn entry(&self, id: EntryId) -> Option<&'a SidebarEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }
}

impl OutlineSource for TreeSource<'_> {
    fn child_count(&self, parent: Option<Row>) -> usize {
        match parent {
            None => self.fixed.len() + self.tags.roots().len(),
            Some(Row::Entry(_)) => 0,
            Some(Row::Project(id)) => self
                .library
                .projects
                .get(id)
                .map_or(0, |node| node.children().len()),
            Some(Row::Tag(id)) => self.tags.get(id).map_or(0, |node| node.children().len()),
        }
    }

    fn child(&self, parent: Option<Row>, index: usize) -> Option<Row> {
        match parent {
            None => match self.fixed.get(index) {
                Some(row) => Some(*row),
                None => self
                    .tags
                    .roots()
                    .get(index - self.fixed.len())
                    .copied()
                    .map(Row::Tag),
            },
            Some(Row::Entry(_)) => None,
            Some(Row::Project(id)) => self
                .library
                .projects
                .get(id)?
                .children()
                .get(index)
                .copied()
                .map(Row::Project),
            Some(Row::Tag(id)) => self
                .tags
                .get(id)?
                .children()
                .get(index)
                .copied()
                .map(Row::Tag),
        }
    }

    fn is_expandable(&self, row: Row) -> bool {
        match row {
            Row::Entry(_) => false,
            Row::Project(id) => self
                .library
                .projects
                .get(id)
                .is_some_and(|node| node.is_expandable()),
            Row::Tag(id) => self.tags.get(id).is_some_and(|node| node.is_expandable()),
        }
    }

    fn label(&self, row: Row) -> String {
        match row {
            Row::Entry(id) => self
                .entry(id)
                .map(|entry| entry.name().to_string())
                .unwrap_or_default(),
            Row::Project(id) => self
                .library
                .projects
                .get(id)
                .map(|node| node.label().to_string())
                .unwrap_or_default(),
            Row::Tag(id) => self
                .tags
                .get(id)
                .map(|node| node.name().to_string())
                .unwrap_or_default(),
        }
    }
}
