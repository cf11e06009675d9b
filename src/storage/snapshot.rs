//! Point-in-time copies of a storage root.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::info;

use super::StorageError;
use super::fs::copy_tree;

/// Directory under a storage root holding its snapshots.
pub const SNAPSHOT_DIR: &str = ".snapshots";

/// Copies `root` into `root/.snapshots/<timestamp>`.
///
/// Earlier snapshots are not copied into later ones.
pub fn take_snapshot(root: &Path, at: DateTime<Utc>) -> Result<PathBuf, StorageError> {
    let target = root
        .join(SNAPSHOT_DIR)
        .join(at.format("%Y%m%dT%H%M%SZ").to_string());
    if target.exists() {
        return Err(StorageError::AlreadyExists { path: target });
    }

    let files = copy_tree(root, &target, |entry| {
        entry.depth() == 1 && entry.file_name() == SNAPSHOT_DIR
    })?;
    info!(root = %root.display(), target = %target.display(), files, "snapshot written");
    Ok(target)
}
