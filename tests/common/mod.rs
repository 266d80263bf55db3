// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed workspace holding a config file, a
// run file, and any referenced scripts, plus a recording backend and log so
// each integration test can drive the engine without a database or network.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use apipush_cli::backend::{Backend, ExecutionResult, TxControl};
use apipush_cli::directive::Directive;
use apipush_cli::logging::Log;
use serde_json::json;

/// An isolated workspace backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct Workspace {
    /// Temporary directory containing the config, run file, and scripts.
    pub root: tempfile::TempDir,
}

impl Workspace {
    /// Path to the workspace root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of `relative` inside the workspace.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Path of the config file written by [`WorkspaceBuilder::with_config`].
    pub fn config_path(&self) -> PathBuf {
        self.path("apipush.toml")
    }

    /// Path of the run file written by [`WorkspaceBuilder::with_run_file`].
    pub fn run_file_path(&self) -> PathBuf {
        self.path("deploy.run")
    }

    /// Contents of the run file as written.
    pub fn run_text(&self) -> String {
        std::fs::read_to_string(self.run_file_path()).expect("read run file")
    }
}

/// Fluent builder for [`Workspace`].
pub struct WorkspaceBuilder {
    ws: Workspace,
}

impl WorkspaceBuilder {
    /// Begin building an empty workspace.
    pub fn new() -> Self {
        Self {
            ws: Workspace {
                root: tempfile::tempdir().expect("create temp dir"),
            },
        }
    }

    /// Write `relative` with `content`, creating parent directories.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        let path = self.ws.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
        self
    }

    /// Write `apipush.toml`.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file("apipush.toml", content)
    }

    /// Write `deploy.run`; every `{root}` in `content` becomes the workspace path.
    pub fn with_run_file(self, content: &str) -> Self {
        let root = self.ws.root_path().display().to_string();
        let content = content.replace("{root}", &root);
        self.with_file("deploy.run", &content)
    }

    /// Finish building and return the workspace.
    pub fn build(self) -> Workspace {
        self.ws
    }
}

/// Backend that records every call and fails those containing a needle.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<String>,
    pub fail_on: Vec<String>,
}

impl RecordingBackend {
    /// A backend rejecting any call whose text contains `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            calls: Vec::new(),
            fail_on: vec![needle.to_string()],
        }
    }

    fn answer(&mut self, call: String) -> ExecutionResult {
        let failed = self.fail_on.iter().any(|n| call.contains(n.as_str()));
        self.calls.push(call);
        if failed {
            ExecutionResult::failure("rejected by test backend")
        } else {
            ExecutionResult::ok(json!({"code": 200}))
        }
    }
}

impl Backend for RecordingBackend {
    fn execute(&mut self, directive: &Directive) -> ExecutionResult {
        self.answer(format!("{}/{}: {}", directive.kind, directive.subtype, directive.content))
    }

    fn transaction(&mut self, control: TxControl) -> ExecutionResult {
        self.answer(control.to_string())
    }
}

/// [`Log`] that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    /// Every recorded line, formatted as `"<level>: <message>"`.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("log lock").clone()
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines
            .lock()
            .expect("log lock")
            .push(format!("{level}: {msg}"));
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn directive(&self, msg: &str, source: Option<&Path>) {
        let line = source.map_or_else(
            || msg.to_string(),
            |path| format!("{msg} ({})", path.display()),
        );
        self.push("directive", &line);
    }
    fn detail(&self, level: u8, msg: &str) {
        self.push(&format!("detail{level}"), msg);
    }
}
