//! Folder and storage command handlers.

use anyhow::{Context, Result, anyhow, bail};
use std::path::Path;

use super::{check_outline, ensure_done, open_sidebar, resolve_row, CliSidebar};
use crate::cli::config::Config;
use crate::cli::{
    AttachArgs, FolderCommand, NewFolderArgs, RenameFolderArgs, SnapshotArgs, TargetArgs,
};
use crate::domain::ProjectId;
use crate::sidebar::Row;
use crate::storage::{SNAPSHOT_DIR, Storage};

fn project_of(sidebar: &CliSidebar, target: &str) -> Result<ProjectId> {
    let row = resolve_row(sidebar, target)?;
    sidebar
        .project_of_row(row)
        .ok_or_else(|| anyhow!("not a folder: {target}"))
}

fn label_of(sidebar: &CliSidebar, id: ProjectId) -> String {
    sidebar
        .storage()
        .library()
        .projects
        .get(id)
        .map(|node| node.label().to_string())
        .unwrap_or_default()
}

pub fn handle_folder(command: &FolderCommand, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    match command {
        FolderCommand::New(args) => handle_folder_new(args, dir, config, yes),
        FolderCommand::Remove(args) => handle_folder_remove(args, dir, config, yes),
        FolderCommand::Rename(args) => handle_folder_rename(args, dir, config, yes),
    }
}

fn handle_folder_new(args: &NewFolderArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let parent = match &args.parent {
        Some(target) => project_of(&sidebar, target)?,
        None => sidebar
            .storage()
            .library()
            .projects
            .default_project()
            .context("library has no root folder")?,
    };

    let created = sidebar.create_project(parent, &args.name);
    ensure_done(&sidebar, created.is_some(), "folder not created")?;
    println!("Created {}/{}", label_of(&sidebar, parent), args.name);
    Ok(())
}

fn handle_folder_remove(args: &TargetArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let id = project_of(&sidebar, &args.target)?;
    if sidebar
        .storage()
        .library()
        .projects
        .get(id)
        .is_some_and(|node| node.is_root())
    {
        bail!("{} is a storage root; use `grove detach`", args.target);
    }

    let label = label_of(&sidebar, id);
    sidebar.select(Row::Project(id), false);
    let removed = sidebar.delete_selected();
    ensure_done(&sidebar, removed, "folder not deleted")?;
    println!("Deleted {label}");
    Ok(())
}

fn handle_folder_rename(
    args: &RenameFolderArgs,
    dir: &Path,
    config: &Config,
    yes: bool,
) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let id = project_of(&sidebar, &args.target)?;
    let label = label_of(&sidebar, id);

    let renamed = sidebar.rename_project(id, &args.name);
    ensure_done(&sidebar, renamed.is_some(), "folder not renamed")?;
    println!("Renamed {} to {}", label, args.name);
    Ok(())
}

pub fn handle_attach(args: &AttachArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;

    if !sidebar.attach_storage(&args.path) {
        ensure_done(&sidebar, false, "storage not attached")?;
    }
    sidebar.wait_for_jobs();

    let path = args.path.canonicalize()?;
    ensure_done(
        &sidebar,
        sidebar.storage().get_by(&path).is_some(),
        "storage not attached",
    )?;
    println!("Attached {}", path.display());
    Ok(())
}

pub fn handle_detach(args: &TargetArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let id = project_of(&sidebar, &args.target)?;
    let is_external = sidebar
        .storage()
        .library()
        .projects
        .get(id)
        .is_some_and(|node| node.is_root() && node.is_external());
    if !is_external {
        bail!("not an attached storage: {}", args.target);
    }

    let label = label_of(&sidebar, id);
    sidebar.select(Row::Project(id), false);
    let detached = sidebar.delete_selected();
    ensure_done(&sidebar, detached, "storage not detached")?;
    println!("Detached {label}");
    Ok(())
}

pub fn handle_snapshot(args: &SnapshotArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    if let Some(target) = &args.target {
        let row = resolve_row(&sidebar, target)?;
        sidebar.select(row, false);
    } else {
        sidebar.select_default_root();
    }

    let started = sidebar.snapshot();
    ensure_done(&sidebar, started, "snapshot not started")?;
    sidebar.wait_for_jobs();
    ensure_done(&sidebar, sidebar.ui().alerts().is_empty(), "snapshot failed")?;

    let root = sidebar
        .selected_project()
        .and_then(|id| sidebar.storage().library().projects.storage_root_of(id))
        .and_then(|id| sidebar.storage().library().projects.get(id))
        .map(|node| node.path().join(SNAPSHOT_DIR));
    match root {
        Some(path) => println!("Snapshot written under {}", path.display()),
        None => println!("Snapshot written"),
    }
    Ok(())
}

pub fn handle_expand(args: &TargetArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let row = resolve_row(&sidebar, &args.target)?;
    if let Row::Entry(_) = row {
        bail!("entries cannot be expanded: {}", args.target);
    }
    sidebar.expand(row);
    check_outline(&sidebar);
    Ok(())
}

pub fn handle_collapse(args: &TargetArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let row = resolve_row(&sidebar, &args.target)?;
    if let Row::Entry(_) = row {
        bail!("entries cannot be collapsed: {}", args.target);
    }
    sidebar.collapse(row);
    check_outline(&sidebar);
    Ok(())
}
