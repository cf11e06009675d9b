//! grove - a notes library browsed through a sidebar of folders and tags

pub mod cli;
pub mod domain;
pub mod sidebar;
pub mod storage;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::Level;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{
        handle_attach, handle_collapse, handle_detach, handle_drop, handle_expand, handle_folder,
        handle_list, handle_menu, handle_snapshot, handle_tag, handle_tags, handle_tree,
    },
};

/// Log level for a `-v` count: warnings by default.
fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_logging(verbose: u8) {
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Completions(args) = &cli.command {
        let mut command = Cli::command();
        clap_complete::generate(args.shell, &mut command, "grove", &mut std::io::stdout());
        return Ok(());
    }

    let config = Config::load()?;
    let dir = config.library_dir(cli.dir.as_ref());
    let yes = cli.yes;

    match &cli.command {
        Command::Tree(args) => handle_tree(args, &dir, &config, yes),
        Command::Tags(args) => handle_tags(args, &dir, &config, yes),
        Command::List(args) => handle_list(args, &dir, &config, yes),
        Command::Tag(command) => handle_tag(command, &dir, &config, yes),
        Command::Folder(command) => handle_folder(command, &dir, &config, yes),
        Command::Attach(args) => handle_attach(args, &dir, &config, yes),
        Command::Detach(args) => handle_detach(args, &dir, &config, yes),
        Command::Snapshot(args) => handle_snapshot(args, &dir, &config, yes),
        Command::Drop(args) => handle_drop(args, &dir, &config, yes),
        Command::Menu(args) => handle_menu(args, &dir, &config, yes),
        Command::Expand(args) => handle_expand(args, &dir, &config, yes),
        Command::Collapse(args) => handle_collapse(args, &dir, &config, yes),
        Command::Completions(_) => Ok(()),
    }
}
