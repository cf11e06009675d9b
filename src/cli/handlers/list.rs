//! Read-only command handlers (tree, tags, ls).

use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::path::Path;

use super::{display_path, open_sidebar, resolve_row, row_label, CliSidebar};
use crate::cli::config::Config;
use crate::cli::output::{NoteListing, Output, OutputFormat, RowListing, TagListing};
use crate::cli::{ListArgs, TagsArgs, TreeArgs};
use crate::domain::{EntryKind, ProjectId, TagPath};
use crate::sidebar::{OutlineSource, Row};
use crate::storage::Storage;

/// Depth-first rows from the root, descending into rows `expand` accepts.
pub(crate) fn outline(
    source: &dyn OutlineSource,
    expand: &dyn Fn(Row) -> bool,
) -> Vec<(usize, Row)> {
    let mut rows = Vec::new();
    let mut stack: Vec<(usize, Row)> = source
        .children(None)
        .into_iter()
        .rev()
        .map(|row| (0, row))
        .collect();

    while let Some((depth, row)) = stack.pop() {
        rows.push((depth, row));
        if source.is_expandable(row) && expand(row) {
            stack.extend(
                source
                    .children(Some(row))
                    .into_iter()
                    .rev()
                    .map(|child| (depth + 1, child)),
            );
        }
    }
    rows
}

pub fn handle_tree(args: &TreeArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let sidebar = open_sidebar(dir, config, yes)?;
    let source = sidebar.source();
    let rows = outline(&source, &|row| args.all || sidebar.is_expanded(row));

    match args.format {
        OutputFormat::Human => {
            for (depth, row) in &rows {
                let marker = match (source.is_expandable(*row), args.all || sidebar.is_expanded(*row)) {
                    (true, true) => "v ",
                    (true, false) => "> ",
                    (false, _) => "  ",
                };
                println!("{}{}{}", "  ".repeat(*depth), marker, row_label(&sidebar, *row));
            }
        }
        OutputFormat::Json => {
            let listings: Vec<RowListing> = rows
                .iter()
                .map(|(depth, row)| RowListing {
                    row: *row,
                    depth: *depth,
                    label: source.label(*row),
                    expandable: source.is_expandable(*row),
                    path: row_path(&sidebar, *row),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&Output::new(listings))?);
        }
        OutputFormat::Paths => {
            for (_, row) in &rows {
                if let Some(path) = row_path(&sidebar, *row) {
                    println!("{path}");
                }
            }
        }
    }
    Ok(())
}

/// Folder path for folder rows, tag path for tag rows.
fn row_path(sidebar: &CliSidebar, row: Row) -> Option<String> {
    match row {
        Row::Tag(_) => sidebar.tag_path_of_row(row).map(|tag| tag.to_string()),
        Row::Project(id) => sidebar
            .storage()
            .library()
            .projects
            .get(id)
            .map(|node| node.path().display().to_string()),
        Row::Entry(_) => None,
    }
}

pub fn handle_tags(args: &TagsArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let sidebar = open_sidebar(dir, config, yes)?;

    let scope: Option<Vec<ProjectId>> = match &args.scope {
        Some(target) => {
            let row = resolve_row(&sidebar, target)?;
            match sidebar.project_of_row(row) {
                Some(id) => Some(vec![id]),
                None => bail!("not a folder: {target}"),
            }
        }
        None => None,
    };
    let tags = sidebar.get_all_tags(scope.as_deref());

    let counts: BTreeMap<TagPath, usize> = if args.counts {
        let notes = &sidebar.storage().library().notes;
        tags.iter()
            .map(|tag| (tag.clone(), notes.tagged_with(tag).len()))
            .collect()
    } else {
        BTreeMap::new()
    };

    match args.format {
        OutputFormat::Human => {
            if tags.is_empty() {
                println!("No tags found.");
            }
            for tag in &tags {
                match counts.get(tag) {
                    Some(count) => println!("{} ({})", tag.to_inline(), count),
                    None => println!("{}", tag.to_inline()),
                }
            }
        }
        OutputFormat::Json => {
            let listings: Vec<TagListing> = tags
                .iter()
                .map(|tag| TagListing {
                    name: tag.to_string(),
                    count: counts.get(tag).copied(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&Output::new(listings))?);
        }
        OutputFormat::Paths => {
            for tag in &tags {
                println!("{tag}");
            }
        }
    }
    Ok(())
}

pub fn handle_list(args: &ListArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;

    let targets: Vec<&str> = if args.targets.is_empty() {
        vec!["@inbox"]
    } else {
        args.targets.iter().map(String::as_str).collect()
    };
    for (i, target) in targets.iter().enumerate() {
        let row = resolve_row(&sidebar, target)?;
        // tag rows extend the selection, so scope a leading tag to every note
        if i == 0 && matches!(row, Row::Tag(_)) {
            sidebar.select_entry(EntryKind::All);
        }
        if !sidebar.select(row, i > 0) {
            bail!("row cannot be selected: {target}");
        }
    }

    let library = sidebar.storage().library();
    let notes: Vec<_> = sidebar
        .ui()
        .table()
        .iter()
        .filter_map(|id| library.notes.get(*id))
        .collect();

    match args.format {
        OutputFormat::Human => {
            if notes.is_empty() {
                println!("No notes found.");
            }
            for note in &notes {
                let tags: Vec<String> = note.tags().iter().map(TagPath::to_inline).collect();
                println!(
                    "{:<40}  {}",
                    display_path(&sidebar, note.path()),
                    tags.join(" ")
                );
            }
        }
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = notes
                .iter()
                .map(|note| NoteListing {
                    id: note.id().to_string(),
                    title: note.title(),
                    path: display_path(&sidebar, note.path()),
                    tags: note.tags().iter().map(ToString::to_string).collect(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&Output::new(listings))?);
        }
        OutputFormat::Paths => {
            for note in &notes {
                println!("{}", note.path().display());
            }
        }
    }
    Ok(())
}
