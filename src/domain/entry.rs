//! Fixed virtual rows of the sidebar.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{EntryId, ProjectId};

/// Kind of a virtual sidebar row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    All,
    Inbox,
    Todo,
    Untagged,
    Archive,
    Trash,
    Label,
    Header,
}

impl EntryKind {
    /// Title shown for the entry when nothing more specific applies.
    pub fn title(&self) -> &'static str {
        match self {
            EntryKind::All => "Notes",
            EntryKind::Inbox => "Inbox",
            EntryKind::Todo => "Todo",
            EntryKind::Untagged => "Untagged",
            EntryKind::Archive => "Archive",
            EntryKind::Trash => "Trash",
            EntryKind::Label => "Label",
            EntryKind::Header => "Header",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::All => "all",
            EntryKind::Inbox => "inbox",
            EntryKind::Todo => "todo",
            EntryKind::Untagged => "untagged",
            EntryKind::Archive => "archive",
            EntryKind::Trash => "trash",
            EntryKind::Label => "label",
            EntryKind::Header => "header",
        };
        f.write_str(name)
    }
}

/// A virtual row, optionally bound to a project.
///
/// Entries are rebuilt together with the root list and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    id: EntryId,
    kind: EntryKind,
    name: String,
    project: Option<ProjectId>,
}

impl SidebarEntry {
    pub fn new(
        id: EntryId,
        kind: EntryKind,
        name: impl Into<String>,
        project: Option<ProjectId>,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            project,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project(&self) -> Option<ProjectId> {
        self.project
    }

    /// Headers never take selection; labels only when they point at a folder.
    pub fn is_selectable(&self) -> bool {
        match self.kind {
            EntryKind::Header => false,
            EntryKind::Label => self.project.is_some(),
            _ => true,
        }
    }
}
