//! Builder for note files placed in a test library.

use std::path::PathBuf;

/// A note file to be written into a [`super::TestEnv`].
///
/// Tags are written inline at the end of the body, the way they are typed
/// in the editor.
#[derive(Debug, Clone)]
pub struct TestNote {
    name: String,
    folder: Option<String>,
    tags: Vec<String>,
    body: String,
}

impl TestNote {
    /// Note named `<name>.md` at the library root.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: None,
            tags: Vec::new(),
            body: String::new(),
        }
    }

    /// Places the note in a folder relative to the library root.
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn tag(mut self, tag: impl AsRef<str>) -> Self {
        self.tags
            .push(tag.as_ref().trim_start_matches('#').to_string());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Path of the file relative to the library root.
    pub fn relative_path(&self) -> PathBuf {
        let file = format!("{}.md", self.name);
        match &self.folder {
            Some(folder) => PathBuf::from(folder).join(file),
            None => PathBuf::from(file),
        }
    }

    /// File contents: the body followed by the inline tags.
    pub fn content(&self) -> String {
        let tags: Vec<String> = self.tags.iter().map(|tag| format!("#{tag}")).collect();
        match (self.body.is_empty(), tags.is_empty()) {
            (_, true) => self.body.clone(),
            (true, false) => tags.join(" "),
            (false, false) => format!("{}\n\n{}", self.body, tags.join(" ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_appends_inline_tags() {
        let note = TestNote::new("plan")
            .folder("Work")
            .tag("#work/urgent")
            .tag("q1")
            .body("Ship it");
        assert_eq!(note.relative_path(), PathBuf::from("Work/plan.md"));
        assert_eq!(note.content(), "Ship it\n\n#work/urgent #q1");
    }

    #[test]
    fn bare_note_has_no_tag_line() {
        assert_eq!(TestNote::new("n").body("x").content(), "x");
    }
}
