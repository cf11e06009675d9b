//! Isolated library in a temp directory.

use super::{GroveCommand, TestNote};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway library, removed on drop.
pub struct TestEnv {
    _temp_dir: TempDir,
    library: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        // canonical so paths printed by the binary compare equal
        let library = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to resolve temp directory");
        Self {
            _temp_dir: temp_dir,
            library,
        }
    }

    pub fn library(&self) -> &Path {
        &self.library
    }

    /// Absolute path of something inside the library.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.library.join(relative)
    }

    /// Writes a note, creating its folder, and returns its absolute path.
    pub fn add_note(&self, note: &TestNote) -> PathBuf {
        let path = self.library.join(note.relative_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create note folder");
        }
        fs::write(&path, note.content()).expect("Failed to write test note");
        path
    }

    pub fn add_folder(&self, relative: &str) -> PathBuf {
        let path = self.library.join(relative);
        fs::create_dir_all(&path).expect("Failed to create folder");
        path
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        fs::read_to_string(self.library.join(relative)).expect("Failed to read file")
    }

    /// A `grove` command pointed at this library.
    pub fn cmd(&self) -> GroveCommand {
        GroveCommand::new().dir(&self.library)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_cleans_up_on_drop() {
        let path = {
            let env = TestEnv::new();
            assert!(env.library().is_dir());
            env.library().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn add_note_creates_folders() {
        let env = TestEnv::new();
        let path = env.add_note(&TestNote::new("plan").folder("Work/Q1").tag("work"));
        assert!(path.is_file());
        assert_eq!(env.read("Work/Q1/plan.md"), "#work");
    }

    #[test]
    fn cmd_targets_library() {
        let env = TestEnv::new();
        let cmd = env.cmd();
        assert_eq!(cmd.get_args()[1], env.library().to_string_lossy());
    }
}
