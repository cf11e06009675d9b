//! Context menu command handler.

use anyhow::{Result, bail};
use std::path::Path;

use super::{ensure_done, open_sidebar, resolve_row};
use crate::cli::MenuArgs;
use crate::cli::config::Config;
use crate::cli::output::{MenuListing, Output, OutputFormat};
use crate::domain::EntryKind;
use crate::sidebar::{MenuCommand, Row};

pub fn handle_menu(args: &MenuArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;

    for (i, target) in args.targets.iter().enumerate() {
        let row = resolve_row(&sidebar, target)?;
        if i == 0 && matches!(row, Row::Tag(_)) {
            sidebar.select_entry(EntryKind::All);
        }
        if !sidebar.select(row, i > 0) {
            bail!("row cannot be selected: {target}");
        }
    }

    if let Some(command) = args.run {
        let state = sidebar.validate_command(command);
        if !state.visible {
            bail!("{} is not available for this selection", command);
        }
        let done = sidebar.perform(command, args.input.as_deref());
        // attach and snapshot finish on a worker thread
        sidebar.wait_for_jobs();
        ensure_done(&sidebar, done && sidebar.ui().alerts().is_empty(), &state.title)?;
        println!("{}: done", state.title);
        return Ok(());
    }

    let items: Vec<MenuListing> = MenuCommand::ALL
        .into_iter()
        .map(|command| MenuListing {
            id: command.id(),
            state: sidebar.validate_command(command),
        })
        .collect();

    match args.format {
        OutputFormat::Human => {
            for item in items.iter().filter(|item| item.state.visible) {
                println!("{:<22}  {}", item.id, item.state.title);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&Output::new(items))?);
        }
        OutputFormat::Paths => {
            for item in items.iter().filter(|item| item.state.visible) {
                println!("{}", item.id);
            }
        }
    }
    Ok(())
}
