//! Forest of hierarchical tags derived from the tags carried by notes.

use std::collections::{BTreeSet, HashMap};

use super::ids::{IdCounter, TagId};
use super::tag_path::TagPath;

/// A single segment in the tag forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagNode {
    id: TagId,
    name: String,
    parent: Option<TagId>,
    children: Vec<TagId>,
}

impl TagNode {
    pub fn id(&self) -> TagId {
        self.id
    }

    /// Returns the segment name (not the full path).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<TagId> {
        self.parent
    }

    pub fn children(&self) -> &[TagId] {
        &self.children
    }

    pub fn is_expandable(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Where a newly created node landed among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInsertion {
    pub id: TagId,
    /// `None` for a root-level tag.
    pub parent: Option<TagId>,
    pub index: usize,
}

/// Result of [`TagForest::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAddition {
    /// Node for the last segment of the added path.
    pub leaf: TagId,
    /// Newly created nodes, topmost first. Empty when the path already existed.
    pub created: Vec<TagId>,
    /// Topmost created node and its sibling index. Rows below it are new too
    /// and are read through the data source when the row is expanded.
    pub inserted: Option<TagInsertion>,
}

/// A node detached from the forest, with its position at the time of removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRemoval {
    pub id: TagId,
    pub parent: Option<TagId>,
    pub index: usize,
}

/// Tags to drop and tags to re-add when renaming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    /// Renamed paths; the controller drops the whole root subtree of each.
    pub delete: Vec<TagPath>,
    /// Every path to add back afterwards, in insertion order.
    pub insert: Vec<TagPath>,
}

/// Arena-backed forest of [`TagNode`]s.
///
/// Roots and children are kept sorted case-insensitively by name and are
/// unique by exact name.
#[derive(Debug, Clone, Default)]
pub struct TagForest {
    nodes: HashMap<TagId, TagNode>,
    roots: Vec<TagId>,
    ids: IdCounter,
}

impl TagForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes across all trees.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[TagId] {
        &self.roots
    }

    pub fn get(&self, id: TagId) -> Option<&TagNode> {
        self.nodes.get(&id)
    }

    /// Children of `parent`, or the roots when `parent` is `None`.
    pub fn children_of(&self, parent: Option<TagId>) -> &[TagId] {
        match parent {
            None => &self.roots,
            Some(id) => self.nodes.get(&id).map_or(&[], |node| node.children()),
        }
    }

    /// Finds the root node with the given name.
    pub fn find_root(&self, name: &str) -> Option<TagId> {
        self.find_child(None, name)
    }

    fn find_child(&self, parent: Option<TagId>, name: &str) -> Option<TagId> {
        self.children_of(parent)
            .iter()
            .copied()
            .find(|id| self.nodes[id].name == name)
    }

    /// Finds the node for a full path.
    pub fn find(&self, path: &TagPath) -> Option<TagId> {
        let mut current = None;
        for segment in path.segments() {
            current = Some(self.find_child(current, segment)?);
        }
        current
    }

    pub fn contains(&self, path: &TagPath) -> bool {
        self.find(path).is_some()
    }

    /// Returns the full path of a node.
    pub fn path_of(&self, id: TagId) -> Option<TagPath> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.nodes.get(&cur)?;
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        TagPath::new(&names.join("/")).ok()
    }

    /// Returns the path of the node and of every descendant, parents first.
    pub fn subtree_paths(&self, id: TagId) -> Vec<TagPath> {
        let mut paths = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(path) = self.path_of(cur) {
                paths.push(path);
            }
            if let Some(node) = self.nodes.get(&cur) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        paths
    }

    /// Returns the paths of every node in the forest, sorted.
    pub fn all_paths(&self) -> BTreeSet<TagPath> {
        self.nodes
            .keys()
            .filter_map(|id| self.path_of(*id))
            .collect()
    }

    /// Index a new root named `name` would take among the existing roots.
    pub fn root_position(&self, name: &str) -> usize {
        self.insertion_index(None, name)
    }

    /// Index a new child named `name` would take if `parent`'s children plus
    /// the candidate were re-sorted case-insensitively.
    fn insertion_index(&self, parent: Option<TagId>, name: &str) -> usize {
        let key = sort_key(name);
        self.children_of(parent)
            .iter()
            .filter(|id| sort_key(&self.nodes[id].name) < key)
            .count()
    }

    fn siblings_mut(&mut self, parent: Option<TagId>) -> Option<&mut Vec<TagId>> {
        match parent {
            None => Some(&mut self.roots),
            Some(id) => self.nodes.get_mut(&id).map(|node| &mut node.children),
        }
    }

    /// Adds a path, creating any missing segment.
    pub fn add(&mut self, path: &TagPath) -> TagAddition {
        let mut parent = None;
        let mut created = Vec::new();
        let mut inserted = None;

        for segment in path.segments() {
            if let Some(existing) = self.find_child(parent, segment) {
                parent = Some(existing);
                continue;
            }

            let id = TagId::from_raw(self.ids.next());
            let index = self.insertion_index(parent, segment);
            if let Some(siblings) = self.siblings_mut(parent) {
                siblings.insert(index, id);
            }
            self.nodes.insert(
                id,
                TagNode {
                    id,
                    name: segment.clone(),
                    parent,
                    children: Vec::new(),
                },
            );

            if inserted.is_none() {
                inserted = Some(TagInsertion { id, parent, index });
            }
            created.push(id);
            parent = Some(id);
        }

        TagAddition {
            // TagPath always has at least one segment
            leaf: parent.unwrap_or(TagId::from_raw(0)),
            created,
            inserted,
        }
    }

    /// Removes `path` unless a live tag still equals or nests under it, then
    /// prunes ancestors left without children and without live tags.
    pub fn remove(&mut self, path: &TagPath, live: &BTreeSet<TagPath>) -> Vec<TagRemoval> {
        let mut removals = Vec::new();
        if !is_allow_tag_removing(path, live) {
            return removals;
        }
        let Some(mut current) = self.find(path) else {
            return removals;
        };
        let mut current_path = path.clone();

        loop {
            let parent = self.nodes[&current].parent;
            if let Some(removal) = self.detach(current) {
                removals.push(removal);
            }

            let (Some(parent_id), Some(parent_path)) = (parent, current_path.parent()) else {
                break;
            };
            if !self.nodes[&parent_id].children.is_empty()
                || !is_allow_tag_removing(&parent_path, live)
            {
                break;
            }

            current = parent_id;
            current_path = parent_path;
        }

        removals
    }

    /// Drops the root named `name` together with its whole subtree.
    pub fn remove_root(&mut self, name: &str) -> Option<TagRemoval> {
        let id = self.find_root(name)?;
        self.detach(id)
    }

    /// Drops every root.
    pub fn clear(&mut self) -> Vec<TagRemoval> {
        let mut removals = Vec::new();
        while let Some(id) = self.roots.last().copied() {
            if let Some(removal) = self.detach(id) {
                removals.push(removal);
            }
        }
        removals
    }

    /// Detaches a node from its siblings and drops it and its descendants.
    pub fn detach(&mut self, id: TagId) -> Option<TagRemoval> {
        let parent = self.nodes.get(&id)?.parent;
        let siblings = self.siblings_mut(parent)?;
        let index = siblings.iter().position(|sibling| *sibling == id)?;
        siblings.remove(index);

        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(&cur) {
                stack.extend(node.children);
            }
        }

        Some(TagRemoval { id, parent, index })
    }
}

fn sort_key(name: &str) -> (String, &str) {
    (name.to_lowercase(), name)
}

/// Returns whether `path` may leave the forest given the live tag set.
///
/// Removal is refused when any live tag equals `path` or is nested under it.
pub fn is_allow_tag_removing(path: &TagPath, live: &BTreeSet<TagPath>) -> bool {
    !live.iter().any(|tag| path.covers(tag))
}

/// Computes which tags to drop and re-add when renaming `old` paths to `new`.
///
/// Live tags covered by an old path get the old prefix replaced by `new`.
/// Live tags that share an old path's first segment but are not themselves
/// renamed are re-added unchanged, since dropping the old root row takes them
/// with it. Prefix matching is segment-exact: renaming `work` leaves `work2`
/// alone.
pub fn plan_rename(old: &[TagPath], new: &TagPath, live: &BTreeSet<TagPath>) -> RenamePlan {
    let mut plan = RenamePlan::default();
    let renamed = |tag: &TagPath| old.iter().any(|o| o.covers(tag));

    for old_path in old {
        plan.delete.push(old_path.clone());

        for tag in live {
            if let Some(replaced) = tag.replace_prefix(old_path, new) {
                push_unique(&mut plan.insert, replaced);
            }
        }

        let root = old_path.root();
        for tag in live {
            if root.covers(tag) && !renamed(tag) {
                push_unique(&mut plan.insert, tag.clone());
            }
        }
    }

    plan
}

fn push_unique(paths: &mut Vec<TagPath>, path: TagPath) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}
