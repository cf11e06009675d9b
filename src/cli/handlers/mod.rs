//! Command handlers for the CLI.

mod drop;
mod folders;
mod list;
mod menu;
mod resolve;
mod tags;


use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cli::config::Config;
use crate::domain::{Note, NoteId};
use crate::sidebar::{
    Dialogs, FolderWatcher, NotesView, OutlineChange, OutlineMirror, OutlineSource, OutlineView,
    Row, Sidebar,
};
use crate::storage::FsStorage;

// Re-export public items
pub use drop::handle_drop;
pub use folders::{
    handle_attach, handle_collapse, handle_detach, handle_expand, handle_folder, handle_snapshot,
};
pub use list::{handle_list, handle_tags, handle_tree};
pub use menu::handle_menu;
pub use resolve::{parse_tag, resolve_note, resolve_row};
pub use tags::handle_tag;

pub(crate) type CliSidebar = Sidebar<FsStorage, ConsoleUi>;

// ===========================================
// Console UI
// ===========================================

/// Terminal stand-in for the sidebar's view collaborators.
///
/// The outline is mirrored so it can be checked after each command; alerts
/// go to stderr and confirmations read a `y` from stdin unless `--yes` was
/// given.
pub struct ConsoleUi {
    pub(crate) mirror: OutlineMirror,
    assume_yes: bool,
    alerts: Vec<String>,
    table: Vec<NoteId>,
    revealed: Vec<PathBuf>,
}

impl ConsoleUi {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            mirror: OutlineMirror::new(),
            assume_yes,
            alerts: Vec::new(),
            table: Vec::new(),
            revealed: Vec::new(),
        }
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Notes listed for the last selection.
    pub fn table(&self) -> &[NoteId] {
        &self.table
    }

    pub fn revealed(&self) -> &[PathBuf] {
        &self.revealed
    }
}

impl OutlineView for ConsoleUi {
    fn apply(&mut self, changes: &[OutlineChange], source: &dyn OutlineSource) {
        debug!(changes = changes.len(), "outline batch");
        self.mirror.apply(changes, source);
    }

    fn expand_row(&mut self, row: Row, source: &dyn OutlineSource) {
        self.mirror.expand_row(row, source);
    }

    fn show_selection(&mut self, rows: &[Row]) {
        self.mirror.show_selection(rows);
    }
}

impl NotesView for ConsoleUi {
    fn reload_note(&mut self, note: &Note) {
        debug!(note = %note, "note changed");
    }

    fn remove_notes(&mut self, notes: &[NoteId]) {
        self.table.retain(|id| !notes.contains(id));
    }

    fn reload_all(&mut self) {}

    fn update_table(&mut self, notes: &[NoteId]) {
        self.table = notes.to_vec();
    }

    fn clear_editor(&mut self) {}

    fn refill_editor(&mut self, _note: &Note) {}

    fn clear_search(&mut self) {}
}

impl Dialogs for ConsoleUi {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{message} [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
            Err(_) => false,
        }
    }

    fn alert(&mut self, message: &str) {
        eprintln!("warning: {message}");
        self.alerts.push(message.to_string());
    }

    fn reveal(&mut self, path: &Path) {
        println!("{}", path.display());
        self.revealed.push(path.to_path_buf());
    }
}

impl FolderWatcher for ConsoleUi {
    fn reload_observed_folders(&mut self, folders: &[PathBuf]) {
        debug!(folders = folders.len(), "watching folders");
    }

    fn unwatch(&mut self, folder: &Path) {
        debug!(folder = %folder.display(), "stopped watching");
    }
}

// ===========================================
// Shared Utilities
// ===========================================

/// Opens the library and builds its sidebar.
pub(crate) fn open_sidebar(dir: &Path, config: &Config, assume_yes: bool) -> Result<CliSidebar> {
    let storage = FsStorage::open(dir)
        .with_context(|| format!("failed to open library at {}", dir.display()))?;
    Ok(Sidebar::new(
        storage,
        ConsoleUi::new(assume_yes),
        config.sidebar_options(),
    ))
}

/// Turns a refused operation into an error, preferring the last alert.
pub(crate) fn ensure_done(sidebar: &CliSidebar, done: bool, what: &str) -> Result<()> {
    check_outline(sidebar);
    if done {
        return Ok(());
    }
    match sidebar.ui().alerts().last() {
        Some(alert) => bail!("{what}: {alert}"),
        None => bail!("{what}: nothing to do"),
    }
}

/// Logs when the mirrored outline drifted from the model.
pub(crate) fn check_outline(sidebar: &CliSidebar) {
    if let Err(mismatch) = sidebar.ui().mirror.verify(&sidebar.source()) {
        warn!(%mismatch, "outline out of sync");
    }
}

/// Label of a row; tags show their leaf name with a `#`.
pub(crate) fn row_label(sidebar: &CliSidebar, row: Row) -> String {
    let label = sidebar.source().label(row);
    match row {
        Row::Tag(_) => format!("#{label}"),
        Row::Entry(_) | Row::Project(_) => label,
    }
}

/// Path of a note relative to the library root when possible.
pub(crate) fn display_path(sidebar: &CliSidebar, path: &Path) -> String {
    path.strip_prefix(sidebar.storage().root())
        .unwrap_or(path)
        .display()
        .to_string()
}
