//! Drop command handler.

use anyhow::{Result, bail};
use std::path::Path;

use super::{ensure_done, open_sidebar, resolve_note, resolve_row};
use crate::cli::DropArgs;
use crate::cli::config::Config;
use crate::domain::NoteId;
use crate::sidebar::{DragOperation, DropPayload};

pub fn handle_drop(args: &DropArgs, dir: &Path, config: &Config, yes: bool) -> Result<()> {
    let mut sidebar = open_sidebar(dir, config, yes)?;
    let row = resolve_row(&sidebar, &args.target)?;

    let payload = if !args.notes.is_empty() {
        let notes = args
            .notes
            .iter()
            .map(|path| resolve_note(&sidebar, path))
            .collect::<Result<Vec<NoteId>>>()?;
        DropPayload::Notes(notes)
    } else if !args.files.is_empty() {
        DropPayload::Files(args.files.clone())
    } else {
        bail!("nothing to drop: pass --note or --file");
    };

    let operation = match sidebar.validate_drop(row, &payload) {
        Some(DragOperation::Move) => "move",
        Some(DragOperation::Copy) => "copy",
        None => bail!("{} does not accept this drop", args.target),
    };
    if args.dry_run {
        println!("{operation}");
        return Ok(());
    }

    let accepted = sidebar.accept_drop(row, &payload);
    ensure_done(&sidebar, accepted, "drop failed")?;
    println!("Dropped onto {} ({operation})", args.target);
    Ok(())
}
