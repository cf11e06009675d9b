//! Core types: TagPath, TagForest, ProjectForest, Note, NoteList, SidebarEntry

mod entry;
mod ids;
mod note;
mod notes;
mod project;
mod tag_forest;
mod tag_path;

pub use entry::{EntryKind, SidebarEntry};
pub use ids::{EntryId, NoteId, ProjectId, TagId};
pub(crate) use ids::IdCounter;
pub use note::{Note, TagChanges};
pub use notes::NoteList;
pub use project::{ProjectDraft, ProjectFlags, ProjectForest, ProjectNode};
pub use tag_forest::{
    RenamePlan, TagAddition, TagForest, TagInsertion, TagNode, TagRemoval,
    is_allow_tag_removing, plan_rename,
};
pub use tag_path::{ParseTagPathError, TagPath};
