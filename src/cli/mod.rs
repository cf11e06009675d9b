//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::sidebar::MenuCommand;
use output::OutputFormat;

/// grove - browse and reshape a notes library through its sidebar tree
#[derive(Parser, Debug)]
#[command(name = "grove", version, about, long_about = None)]
pub struct Cli {
    /// Library directory (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the sidebar tree
    Tree(TreeArgs),

    /// List the tags shown in the sidebar
    Tags(TagsArgs),

    /// List the notes a sidebar row selects
    #[command(name = "ls")]
    List(ListArgs),

    /// Add, remove, rename or delete tags
    #[command(subcommand)]
    Tag(TagCommand),

    /// Create, remove or rename folders
    #[command(subcommand)]
    Folder(FolderCommand),

    /// Attach an outside directory as an external storage
    Attach(AttachArgs),

    /// Detach an external storage (files stay on disk)
    Detach(TargetArgs),

    /// Copy a storage root into its snapshot folder
    Snapshot(SnapshotArgs),

    /// Drop notes or files onto a sidebar row
    Drop(DropArgs),

    /// Show or run the context menu of a sidebar row
    Menu(MenuArgs),

    /// Expand a folder or tag row
    Expand(TargetArgs),

    /// Collapse a folder or tag row
    Collapse(TargetArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `tree` command
#[derive(Parser, Debug)]
pub struct TreeArgs {
    /// Show every row, ignoring the saved expansion state
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `tags` command
#[derive(Parser, Debug)]
pub struct TagsArgs {
    /// Only tags of notes under this folder
    #[arg(long = "in")]
    pub scope: Option<String>,

    /// Show note counts for each tag
    #[arg(long)]
    pub counts: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `ls` (list) command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Rows to select: a folder path, `@entry` or `#tag` (default: `@inbox`)
    pub targets: Vec<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Add a tag to notes
    Add(TagNotesArgs),

    /// Remove a tag from notes
    #[command(name = "rm")]
    Remove(TagNotesArgs),

    /// Rename tags (and everything nested under them)
    Rename(RenameTagArgs),

    /// Strip a tag and its sub-tags from every note
    Delete(DeleteTagArgs),
}

/// Arguments for `tag add` and `tag rm`
#[derive(Parser, Debug)]
pub struct TagNotesArgs {
    /// Tag path, with or without the leading `#`
    pub tag: String,

    /// Note files (relative to the library or absolute)
    #[arg(required = true)]
    pub notes: Vec<PathBuf>,
}

/// Arguments for `tag rename`
#[derive(Parser, Debug)]
pub struct RenameTagArgs {
    /// New tag path
    #[arg(long = "to")]
    pub to: String,

    /// Tags to rename
    #[arg(required = true)]
    pub from: Vec<String>,
}

/// Arguments for `tag delete`
#[derive(Parser, Debug)]
pub struct DeleteTagArgs {
    /// Tag path
    pub tag: String,
}

#[derive(Subcommand, Debug)]
pub enum FolderCommand {
    /// Create a sub-folder
    New(NewFolderArgs),

    /// Delete a folder and its notes
    #[command(name = "rm")]
    Remove(TargetArgs),

    /// Rename a folder
    Rename(RenameFolderArgs),
}

/// Arguments for `folder new`
#[derive(Parser, Debug)]
pub struct NewFolderArgs {
    /// Name of the new folder
    pub name: String,

    /// Parent row (default: the library root)
    #[arg(short, long)]
    pub parent: Option<String>,
}

/// Arguments for `folder rename`
#[derive(Parser, Debug)]
pub struct RenameFolderArgs {
    /// Folder to rename
    pub target: String,

    /// New name
    pub name: String,
}

/// A single sidebar row.
#[derive(Parser, Debug)]
pub struct TargetArgs {
    /// Folder path, `@entry` or `#tag`
    pub target: String,
}

/// Arguments for the `attach` command
#[derive(Parser, Debug)]
pub struct AttachArgs {
    /// Directory to attach
    pub path: PathBuf,
}

/// Arguments for the `snapshot` command
#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    /// Row whose storage root is copied (default: the library root)
    pub target: Option<String>,
}

/// Arguments for the `drop` command
#[derive(Parser, Debug)]
pub struct DropArgs {
    /// Row to drop onto
    pub target: String,

    /// Library notes to drop (can be specified multiple times)
    #[arg(short, long = "note", action = ArgAction::Append, conflicts_with = "files")]
    pub notes: Vec<PathBuf>,

    /// Outside files or directories to drop (can be specified multiple times)
    #[arg(short = 'F', long = "file", action = ArgAction::Append)]
    pub files: Vec<PathBuf>,

    /// Only report the operation the drop would perform
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `menu` command
#[derive(Parser, Debug)]
pub struct MenuArgs {
    /// Rows to select before opening the menu
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Command to run, e.g. `sidebar.rename` or `rename`
    #[arg(long)]
    pub run: Option<MenuCommand>,

    /// Text the command needs (new name, directory)
    #[arg(long)]
    pub input: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `completions` command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
