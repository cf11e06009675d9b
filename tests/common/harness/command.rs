//! Fluent wrapper around assert_cmd::Command.

#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Builder for one invocation of the `grove` binary.
pub struct GroveCommand {
    args: Vec<String>,
    stdin: Option<String>,
}

impl GroveCommand {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Sets `--dir` to the library under test.
    pub fn dir(mut self, path: &Path) -> Self {
        self.args.push("--dir".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Text fed to the confirmation prompt.
    pub fn answer(mut self, text: &str) -> Self {
        self.stdin = Some(text.to_string());
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("grove").expect("Failed to find grove binary");
        cmd.args(&self.args);
        // keep the user's config file out of the way
        cmd.env("XDG_CONFIG_HOME", std::env::temp_dir().join("grove-tests-config"));
        match self.stdin {
            Some(text) => cmd.write_stdin(text),
            None => cmd.write_stdin(""),
        };
        cmd.assert()
    }

    /// Runs the command, expects success and returns stdout.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    pub fn tree(self) -> Self {
        self.args(["tree"])
    }

    pub fn tags(self) -> Self {
        self.args(["tags"])
    }

    /// `ls` with the given targets.
    pub fn ls<I, S>(self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args(["ls"]).args(targets)
    }

    pub fn yes(self) -> Self {
        self.args(["--yes"])
    }

    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }

    pub fn format_paths(self) -> Self {
        self.args(["--format", "paths"])
    }
}

impl Default for GroveCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn command_runs_binary() {
        GroveCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn command_with_dir() {
        let temp = TempDir::new().unwrap();
        let cmd = GroveCommand::new().dir(temp.path());
        let args = cmd.get_args();
        assert_eq!(args[0], "--dir");
        assert_eq!(args[1], temp.path().to_string_lossy());
    }

    #[test]
    fn command_shortcuts() {
        let cmd = GroveCommand::new().ls(["@all"]).format_json();
        assert_eq!(cmd.get_args(), &["ls", "@all", "--format", "json"]);
    }
}
