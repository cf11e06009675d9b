//! Context menu commands and their validation.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::{Sidebar, SidebarUi};
use crate::domain::TagPath;
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuCommand {
    RenameTag,
    RemoveTags,
    Attach,
    Snapshot,
    Reveal,
    Rename,
    Delete,
    NewFolder,
}

impl MenuCommand {
    pub const ALL: [MenuCommand; 8] = [
        MenuCommand::RenameTag,
        MenuCommand::RemoveTags,
        MenuCommand::Attach,
        MenuCommand::Snapshot,
        MenuCommand::Reveal,
        MenuCommand::Rename,
        MenuCommand::Delete,
        MenuCommand::NewFolder,
    ];

    /// Stable identifier, e.g. `sidebar.rename-tag`.
    pub fn id(self) -> &'static str {
        match self {
            MenuCommand::RenameTag => "sidebar.rename-tag",
            MenuCommand::RemoveTags => "sidebar.remove-tags",
            MenuCommand::Attach => "sidebar.attach",
            MenuCommand::Snapshot => "sidebar.snapshot",
            MenuCommand::Reveal => "sidebar.reveal",
            MenuCommand::Rename => "sidebar.rename",
            MenuCommand::Delete => "sidebar.delete",
            MenuCommand::NewFolder => "sidebar.new-folder",
        }
    }
}

impl fmt::Display for MenuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned for an unknown command id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMenuCommandError(String);

impl fmt::Display for ParseMenuCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown menu command: {}", self.0)
    }
}

impl std::error::Error for ParseMenuCommandError {}

impl FromStr for MenuCommand {
    type Err = ParseMenuCommandError;

    /// Accepts the full id or the part after `sidebar.`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.strip_prefix("sidebar.").unwrap_or(s);
        MenuCommand::ALL
            .into_iter()
            .find(|cmd| cmd.id().strip_prefix("sidebar.") == Some(wanted))
            .ok_or_else(|| ParseMenuCommandError(s.to_string()))
    }
}

/// How a menu item should be shown for the current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItemState {
    pub visible: bool,
    pub title: String,
}

impl MenuItemState {
    fn new(visible: bool, title: &str) -> Self {
        Self {
            visible,
            title: title.to_string(),
        }
    }
}

impl<S: Storage, U: SidebarUi> Sidebar<S, U> {
    pub fn validate_command(&self, command: MenuCommand) -> MenuItemState {
        let has_tags = !self.selected_tags().is_empty();
        let node = self
            .selected_project()
            .and_then(|id| self.storage.library().projects.get(id));
        let hidden_folder = node.is_some_and(|n| n.is_trash() || n.is_archive());

        match command {
            MenuCommand::RenameTag => MenuItemState::new(has_tags, "Rename Tag"),
            MenuCommand::RemoveTags => MenuItemState::new(has_tags, "Remove Tags"),
            MenuCommand::Attach => MenuItemState::new(true, "Attach Storage"),
            MenuCommand::Snapshot => MenuItemState::new(
                !has_tags && node.is_some_and(|n| !n.is_trash()),
                "Make Snapshot",
            ),
            MenuCommand::Reveal => {
                MenuItemState::new(!has_tags && node.is_some(), "Reveal in File Manager")
            }
            MenuCommand::NewFolder => {
                MenuItemState::new(!has_tags && node.is_some() && !hidden_folder, "New Folder")
            }
            MenuCommand::Rename if has_tags => MenuItemState::new(true, "Rename Tag"),
            MenuCommand::Rename => MenuItemState::new(
                node.is_some_and(|n| !n.is_trash() && !n.is_archive() && !n.is_default() && !n.is_root()),
                "Rename Folder",
            ),
            MenuCommand::Delete if has_tags => MenuItemState::new(true, "Delete Tag"),
            MenuCommand::Delete => match node {
                Some(n) if hidden_folder || n.is_default() => MenuItemState::new(false, "Delete Folder"),
                Some(n) if n.is_root() => MenuItemState::new(true, "Detach Storage"),
                Some(_) => MenuItemState::new(true, "Delete Folder"),
                None => MenuItemState::new(false, "Delete Folder"),
            },
        }
    }

    /// Runs a menu command against the selection.
    ///
    /// `input` carries the text a command needs: the new name for renames
    /// and new folders, the directory for attach.
    pub fn perform(&mut self, command: MenuCommand, input: Option<&str>) -> bool {
        if !self.validate_command(command).visible {
            return false;
        }
        match command {
            MenuCommand::RenameTag => self.rename_selected_tags(input),
            MenuCommand::Rename if !self.selected_tags().is_empty() => {
                self.rename_selected_tags(input)
            }
            MenuCommand::RemoveTags | MenuCommand::Delete => self.delete_selected(),
            MenuCommand::Attach => match input {
                Some(path) => self.attach_storage(Path::new(path)),
                None => false,
            },
            MenuCommand::Snapshot => self.snapshot(),
            MenuCommand::Reveal => self.reveal(),
            MenuCommand::Rename => {
                let (Some(id), Some(name)) = (self.selected_project(), input) else {
                    return false;
                };
                self.rename_project(id, name).is_some()
            }
            MenuCommand::NewFolder => {
                let (Some(id), Some(name)) = (self.selected_project(), input) else {
                    return false;
                };
                self.create_project(id, name).is_some()
            }
        }
    }

    fn rename_selected_tags(&mut self, input: Option<&str>) -> bool {
        let Some(new) = input.and_then(|raw| raw.trim_start_matches('#').parse::<TagPath>().ok())
        else {
            return false;
        };
        let old = self.selected_tags();
        self.rename_tag(&old, &new)
    }
}
