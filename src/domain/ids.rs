//! Stable integer identifiers for arena-owned nodes.
//!
//! Each arena hands out ids from its own counter and never reuses them, so an
//! id stays a valid identity for change detection even after the node it named
//! has been removed.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw identifier value.
            pub fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw identifier value.
            pub fn as_u32(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

node_id!(
    /// Identifier of a node in the tag forest.
    TagId,
    "t"
);

node_id!(
    /// Identifier of a folder in the project forest.
    ProjectId,
    "p"
);

node_id!(
    /// Identifier of a note in the global note list.
    NoteId,
    "n"
);

node_id!(
    /// Identifier of a virtual sidebar entry.
    EntryId,
    "e"
);

/// Monotonic id source owned by a single arena.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdCounter(u32);

impl IdCounter {
    pub(crate) fn next(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }
}
