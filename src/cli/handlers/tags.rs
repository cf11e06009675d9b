//! Tag command handlers (tag add, rm, rename, delete).

use anyhow::{Result, bail};
use std::path::Path;

use super::{ensure_done, open_sidebar, parse_tag, resolve_note};
use crate::cli::config::Config;
use crate::cli::{DeleteTagArgs, RenameTagArgs, TagCommand, TagNotesArgs};
use crate::domain::{NoteId, TagPath};

pub fn handle_tag(command: &TagCommand, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    match command {
        TagCommand::Add(args) => handle_tag_add(args, dir, config, yes),
        TagCommand::Remove(args) => handle_tag_remove(args, dir, config, yes),
        TagCommand::Rename(args) => handle_tag_rename(args, dir, config, yes),
        TagCommand::Delete(args) => handle_tag_delete(args, dir, config, yes),
    }
}

fn handle_tag_add(args: &TagNotesArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let tag = parse_tag(&args.tag)?;
    let notes = args
        .notes
        .iter()
        .map(|path| resolve_note(&sidebar, path))
        .collect::<Result<Vec<NoteId>>>()?;

    let tagged = sidebar.tag_notes(&tag, &notes);
    ensure_done(&sidebar, sidebar.ui().alerts().is_empty(), "failed to tag notes")?;
    println!("Tagged {} note(s) with {}", tagged, tag.to_inline());
    Ok(())
}

fn handle_tag_remove(args: &TagNotesArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let tag = parse_tag(&args.tag)?;
    let notes = args
        .notes
        .iter()
        .map(|path| resolve_note(&sidebar, path))
        .collect::<Result<Vec<NoteId>>>()?;

    let untagged = sidebar.untag_notes(&tag, &notes);
    ensure_done(&sidebar, sidebar.ui().alerts().is_empty(), "failed to untag notes")?;
    println!("Removed {} from {} note(s)", tag.to_inline(), untagged);
    Ok(())
}

fn handle_tag_rename(args: &RenameTagArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let to = parse_tag(&args.to)?;
    let from = args
        .from
        .iter()
        .map(|raw| parse_tag(raw))
        .collect::<Result<Vec<TagPath>>>()?;

    if let Some(missing) = from.iter().find(|tag| sidebar.row_for_tag(tag).is_none()) {
        bail!("no tag '{missing}' in the sidebar");
    }

    let renamed = sidebar.rename_tag(&from, &to);
    ensure_done(&sidebar, renamed, "failed to rename tag")?;
    println!("Renamed to {}", to.to_inline());
    Ok(())
}

fn handle_tag_delete(args: &DeleteTagArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let tag = parse_tag(&args.tag)?;

    if !sidebar.select_tag(&tag) {
        bail!("no tag '{tag}' in the sidebar");
    }
    let deleted = sidebar.delete_selected_tags();
    ensure_done(&sidebar, deleted, "tag not deleted")?;
    println!("Deleted {}", tag.to_inline());
    Ok(())
}
