//! Filesystem-backed folders ("projects") and the forest that owns them.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::ids::{IdCounter, ProjectId};

/// Role and display flags of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectFlags {
    /// Top of a storage tree (the default library or an attached folder).
    pub is_root: bool,
    /// Storage root attached from outside the default library.
    pub is_external: bool,
    pub is_trash: bool,
    pub is_archive: bool,
    /// The default library root. Exactly one project carries this flag.
    pub is_default: bool,
    pub is_expanded: bool,
    /// Whether notes here show up under "All Notes".
    pub show_in_common: bool,
}

/// A folder in the project forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNode {
    id: ProjectId,
    path: PathBuf,
    label: String,
    parent: Option<ProjectId>,
    children: Vec<ProjectId>,
    flags: ProjectFlags,
}

impl ProjectNode {
    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parent(&self) -> Option<ProjectId> {
        self.parent
    }

    /// Visible sub-folders. Trash and archive folders are parented to their
    /// storage root but never listed here.
    pub fn children(&self) -> &[ProjectId] {
        &self.children
    }

    pub fn flags(&self) -> ProjectFlags {
        self.flags
    }

    pub fn is_root(&self) -> bool {
        self.flags.is_root
    }

    pub fn is_external(&self) -> bool {
        self.flags.is_external
    }

    pub fn is_trash(&self) -> bool {
        self.flags.is_trash
    }

    pub fn is_archive(&self) -> bool {
        self.flags.is_archive
    }

    pub fn is_default(&self) -> bool {
        self.flags.is_default
    }

    pub fn is_expanded(&self) -> bool {
        self.flags.is_expanded
    }

    pub fn is_expandable(&self) -> bool {
        !self.children.is_empty()
    }

    fn is_hidden_child(&self) -> bool {
        self.flags.is_trash || self.flags.is_archive
    }
}

/// Describes a project before it is registered in the forest.
#[derive(Debug, Clone)]
pub struct ProjectDraft {
    pub path: PathBuf,
    pub label: String,
    pub flags: ProjectFlags,
}

impl ProjectDraft {
    /// Creates a plain folder draft labelled after its last path component.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            label,
            flags: ProjectFlags {
                show_in_common: true,
                ..ProjectFlags::default()
            },
        }
    }

    pub fn with_flags(mut self, flags: ProjectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Arena of [`ProjectNode`]s keyed by path.
#[derive(Debug, Clone, Default)]
pub struct ProjectForest {
    nodes: BTreeMap<ProjectId, ProjectNode>,
    by_path: HashMap<PathBuf, ProjectId>,
    roots: Vec<ProjectId>,
    ids: IdCounter,
}

impl ProjectForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Storage roots in registration order.
    pub fn roots(&self) -> &[ProjectId] {
        &self.roots
    }

    pub fn get(&self, id: ProjectId) -> Option<&ProjectNode> {
        self.nodes.get(&id)
    }

    pub fn get_by_path(&self, path: &Path) -> Option<ProjectId> {
        self.by_path.get(path).copied()
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectNode> {
        self.nodes.values()
    }

    /// Registers a project under `parent`, or as a storage root.
    ///
    /// Visible folders are prepended to the parent's children, so the newest
    /// folder comes first at its level. Returns `None` when a project already
    /// exists at that path or the parent is unknown.
    pub fn insert(&mut self, draft: ProjectDraft, parent: Option<ProjectId>) -> Option<ProjectId> {
        if self.by_path.contains_key(&draft.path) {
            return None;
        }
        if parent.is_some_and(|parent_id| !self.nodes.contains_key(&parent_id)) {
            return None;
        }

        let id = ProjectId::from_raw(self.ids.next());
        let node = ProjectNode {
            id,
            path: draft.path.clone(),
            label: draft.label,
            parent,
            children: Vec::new(),
            flags: draft.flags,
        };

        match parent {
            Some(parent_id) if !node.is_hidden_child() => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    parent_node.children.insert(0, id);
                }
            }
            Some(_) => {}
            None => self.roots.push(id),
        }

        self.by_path.insert(draft.path, id);
        self.nodes.insert(id, node);
        Some(id)
    }

    /// Sorts a project's visible children case-insensitively by label.
    pub fn sort_children(&mut self, id: ProjectId) {
        let Some(children) = self.nodes.get(&id).map(|node| node.children.clone()) else {
            return;
        };
        let mut keyed: Vec<(String, ProjectId)> = children
            .into_iter()
            .filter_map(|child| {
                self.nodes
                    .get(&child)
                    .map(|node| (node.label.to_lowercase(), child))
            })
            .collect();
        keyed.sort();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = keyed.into_iter().map(|(_, child)| child).collect();
        }
    }

    /// Deepest project whose directory strictly contains `path`.
    pub fn find_parent(&self, path: &Path) -> Option<ProjectId> {
        self.nodes
            .values()
            .filter(|node| path != node.path && path.starts_with(&node.path))
            .max_by_key(|node| node.path.components().count())
            .map(|node| node.id)
    }

    /// Every project below `id`, hidden trash and archive folders included.
    pub fn descendants(&self, id: ProjectId) -> Vec<ProjectId> {
        self.nodes
            .values()
            .filter(|node| node.id != id && self.is_descendant(node.id, id))
            .map(|node| node.id)
            .collect()
    }

    fn is_descendant(&self, id: ProjectId, ancestor: ProjectId) -> bool {
        let mut current = self.nodes.get(&id).and_then(|node| node.parent);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.nodes.get(&cur).and_then(|node| node.parent);
        }
        false
    }

    /// Walks up to the storage root containing `id` (itself when it is one).
    pub fn storage_root_of(&self, id: ProjectId) -> Option<ProjectId> {
        let mut current = self.nodes.get(&id)?;
        while let Some(parent) = current.parent {
            current = self.nodes.get(&parent)?;
        }
        Some(current.id)
    }

    /// Detaches `id` and drops it with its whole subtree.
    ///
    /// Returns the removed nodes, `id` first.
    pub fn remove(&mut self, id: ProjectId) -> Vec<ProjectNode> {
        let Some(parent) = self.nodes.get(&id).map(|node| node.parent) else {
            return Vec::new();
        };

        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    parent_node.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }

        let mut ids = vec![id];
        ids.extend(self.descendants(id));

        ids.into_iter()
            .filter_map(|removed| {
                let node = self.nodes.remove(&removed)?;
                self.by_path.remove(&node.path);
                Some(node)
            })
            .collect()
    }

    pub fn default_project(&self) -> Option<ProjectId> {
        self.nodes
            .values()
            .find(|node| node.flags.is_default)
            .map(|node| node.id)
    }

    fn special_of(&self, root: ProjectId, pick: fn(&ProjectFlags) -> bool) -> Option<ProjectId> {
        self.nodes
            .values()
            .find(|node| node.parent == Some(root) && pick(&node.flags))
            .map(|node| node.id)
    }

    /// Trash folder of a storage root.
    pub fn trash_of(&self, root: ProjectId) -> Option<ProjectId> {
        self.special_of(root, |flags| flags.is_trash)
    }

    /// Archive folder of a storage root.
    pub fn archive_of(&self, root: ProjectId) -> Option<ProjectId> {
        self.special_of(root, |flags| flags.is_archive)
    }

    /// Sets the expanded flag and reports whether it changed.
    pub fn set_expanded(&mut self, id: ProjectId, expanded: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if node.flags.is_expanded != expanded => {
                node.flags.is_expanded = expanded;
                true
            }
            _ => false,
        }
    }

    pub fn expanded_paths(&self) -> BTreeSet<PathBuf> {
        self.nodes
            .values()
            .filter(|node| node.flags.is_expanded)
            .map(|node| node.path.clone())
            .collect()
    }
}
