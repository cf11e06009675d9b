//! Resolution of command-line targets to sidebar rows and notes.

use anyhow::{Context, Result, anyhow, bail};
use std::path::Path;

use super::CliSidebar;
use crate::domain::{EntryKind, NoteId, TagPath};
use crate::sidebar::Row;
use crate::storage::Storage;

/// Parses a tag given with or without its leading `#`.
pub fn parse_tag(raw: &str) -> Result<TagPath> {
    let trimmed = raw.trim().trim_start_matches('#');
    trimmed
        .parse()
        .with_context(|| format!("invalid tag: {raw}"))
}

fn parse_entry(name: &str) -> Option<EntryKind> {
    match name.to_ascii_lowercase().as_str() {
        "all" | "notes" => Some(EntryKind::All),
        "inbox" => Some(EntryKind::Inbox),
        "todo" => Some(EntryKind::Todo),
        "untagged" => Some(EntryKind::Untagged),
        "archive" => Some(EntryKind::Archive),
        "trash" => Some(EntryKind::Trash),
        _ => None,
    }
}

/// Resolves a target to a row.
///
/// Accepted forms:
/// 1. `#tag/path` for a tag row
/// 2. `@inbox`, `@all`, `@todo`, `@untagged`, `@archive`, `@trash` for entries
/// 3. A folder path, relative to the library root or absolute
pub fn resolve_row(sidebar: &CliSidebar, target: &str) -> Result<Row> {
    let target = target.trim();

    if target.starts_with('#') {
        let tag = parse_tag(target)?;
        return sidebar
            .row_for_tag(&tag)
            .ok_or_else(|| anyhow!("no tag '{tag}' in the sidebar"));
    }

    if let Some(name) = target.strip_prefix('@') {
        let kind = parse_entry(name).ok_or_else(|| anyhow!("unknown entry: @{name}"))?;
        return sidebar
            .row_for_entry(kind)
            .ok_or_else(|| anyhow!("entry @{name} is not shown"));
    }

    let path = absolute(sidebar, Path::new(target))?;
    match sidebar.row_for_path(&path) {
        Some(row) => Ok(row),
        None if sidebar.storage().project_exist(&path) => {
            bail!("folder is not shown in the sidebar: {target}")
        }
        None => bail!("not a folder of the library: {target}"),
    }
}

/// Resolves a note file, relative to the library root or absolute.
pub fn resolve_note(sidebar: &CliSidebar, path: &Path) -> Result<NoteId> {
    let absolute = absolute(sidebar, path)?;
    sidebar
        .storage()
        .library()
        .notes
        .get_by_path(&absolute)
        .ok_or_else(|| anyhow!("not a note of the library: {}", path.display()))
}

fn absolute(sidebar: &CliSidebar, path: &Path) -> Result<std::path::PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        sidebar.storage().root().join(path)
    };
    joined
        .canonicalize()
        .with_context(|| format!("no such file or directory: {}", path.display()))
}
