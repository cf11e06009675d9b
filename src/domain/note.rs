//! A note file with the inline tags found in its content.

use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::ids::{NoteId, ProjectId};
use super::tag_path::TagPath;

/// `#tag` tokens preceded by the start of the text or by whitespace.
static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)#([^\s#]+)").expect("inline tag pattern is valid"));

const TRAILING_PUNCTUATION: &[char] = &[',', '.', ';', ':', '!', '?', ')', '"', '\''];

/// Tags that appeared or disappeared during a content scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagChanges {
    pub added: Vec<TagPath>,
    pub removed: Vec<TagPath>,
}

impl TagChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A note stored in a project folder.
///
/// The content is authoritative: `tags` is always the result of the last
/// [`Note::scan_content_tags`] and is ordered by first appearance.
#[derive(Clone, PartialEq, Eq)]
pub struct Note {
    id: NoteId,
    path: PathBuf,
    project: ProjectId,
    content: String,
    tags: Vec<TagPath>,
}

impl Note {
    /// Creates a note and scans its content for tags.
    pub fn new(
        id: NoteId,
        path: impl Into<PathBuf>,
        project: ProjectId,
        content: impl Into<String>,
    ) -> Self {
        let mut note = Self {
            id,
            path: path.into(),
            project,
            content: content.into(),
            tags: Vec::new(),
        };
        note.scan_content_tags();
        note
    }

    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without extension.
    pub fn title(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn project(&self) -> ProjectId {
        self.project
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &[TagPath] {
        &self.tags
    }

    /// Whether the note carries `tag` or a tag nested under it.
    pub fn has_tag_under(&self, tag: &TagPath) -> bool {
        self.tags.iter().any(|own| tag.covers(own))
    }

    /// Points the note at a new folder after its file was moved.
    pub fn relocate(&mut self, project: ProjectId, path: impl Into<PathBuf>) {
        self.project = project;
        self.path = path.into();
    }

    /// Appends `#tag` to the content. Returns `false` if already tagged.
    pub fn add_tag(&mut self, tag: &TagPath) -> bool {
        if self.tags.contains(tag) {
            return false;
        }
        if !self.content.is_empty() && !self.content.ends_with(char::is_whitespace) {
            self.content.push(' ');
        }
        self.content.push_str(&tag.to_inline());
        true
    }

    /// Removes every inline `#tag` token (exact match only).
    pub fn delete_tag(&mut self, tag: &TagPath) -> bool {
        match rewrite_inline(&self.content, tag, None) {
            Some(rewritten) => {
                self.content = rewritten;
                true
            }
            None => false,
        }
    }

    /// Replaces `#old` with `#new`, including tokens nested under `old`
    /// (`#old/sub` becomes `#new/sub`).
    pub fn replace_tag(&mut self, old: &TagPath, new: &TagPath) -> bool {
        match rewrite_inline(&self.content, old, Some(new)) {
            Some(rewritten) => {
                self.content = rewritten;
                true
            }
            None => false,
        }
    }

    /// Drops a tag from the scanned list without touching the content.
    pub fn forget_tag(&mut self, tag: &TagPath) {
        self.tags.retain(|own| own != tag);
    }

    /// Re-derives `tags` from the content.
    pub fn scan_content_tags(&mut self) -> TagChanges {
        let mut scanned: Vec<TagPath> = Vec::new();
        for capture in INLINE_TAG.captures_iter(&self.content) {
            let raw = capture[1].trim_end_matches(TRAILING_PUNCTUATION);
            match TagPath::new(raw) {
                Ok(tag) if !scanned.contains(&tag) => scanned.push(tag),
                _ => {}
            }
        }

        let changes = TagChanges {
            added: scanned
                .iter()
                .filter(|tag| !self.tags.contains(tag))
                .cloned()
                .collect(),
            removed: self
                .tags
                .iter()
                .filter(|tag| !scanned.contains(tag))
                .cloned()
                .collect(),
        };
        self.tags = scanned;
        changes
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title(), self.id)
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("project", &self.project)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Rewrites inline occurrences of `#tag`.
///
/// With a replacement, tokens nested under `tag` are rewritten too and only
/// the prefix changes. Without one, exact tokens are removed along with one
/// adjacent space. Returns `None` when nothing matched.
fn rewrite_inline(content: &str, tag: &TagPath, replacement: Option<&TagPath>) -> Option<String> {
    let needle = tag.to_inline();
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    let mut changed = false;

    while let Some(pos) = rest.find(&needle) {
        let before = rest[..pos].chars().next_back().or_else(|| out.chars().next_back());
        let starts_token = before.is_none_or(char::is_whitespace);
        // the token ends where the scanner stops: whitespace, `#` or the end
        let tail = &rest[pos + needle.len()..];
        let token_end = tail
            .find(|c: char| c.is_whitespace() || c == '#')
            .unwrap_or(tail.len());
        let suffix = tail[..token_end].trim_end_matches(TRAILING_PUNCTUATION);
        let ends_token = match suffix.chars().next() {
            None => true,
            Some('/') => replacement.is_some() || suffix.chars().all(|c| c == '/'),
            Some(_) => false,
        };
        let after = tail[suffix.len()..].chars().next();

        if !(starts_token && ends_token) {
            out.push_str(&rest[..pos + needle.len()]);
            rest = &rest[pos + needle.len()..];
            continue;
        }

        changed = true;
        out.push_str(&rest[..pos]);
        match replacement {
            Some(new) => out.push_str(&new.to_inline()),
            None => {
                let closes = |c: char| c == ' ' || TRAILING_PUNCTUATION.contains(&c);
                if out.ends_with(' ') && after.is_none_or(closes) {
                    out.pop();
                }
            }
        }
        rest = match replacement {
            Some(_) => &rest[pos + needle.len()..],
            None => &tail[suffix.len()..],
        };
    }

    out.push_str(rest);
    changed.then_some(out)
}
