//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use crate::sidebar::{MenuItemState, Row};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
    /// Plain file paths, one per line
    Paths,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// One outline row in `tree` output.
#[derive(Debug, Serialize)]
pub struct RowListing {
    pub row: Row,
    pub depth: usize,
    pub label: String,
    pub expandable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A note in `ls` output.
#[derive(Debug, Serialize)]
pub struct NoteListing {
    pub id: String,
    pub title: String,
    pub path: String,
    pub tags: Vec<String>,
}

/// A tag with optional count.
#[derive(Debug, Serialize)]
pub struct TagListing {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// A context menu item in `menu` output.
#[derive(Debug, Serialize)]
pub struct MenuListing {
    pub id: &'static str,
    #[serde(flatten)]
    pub state: MenuItemState,
}
