//! Logging infrastructure for structured console and file output.

mod logger;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use subscriber::{RunHeader, init_subscriber};
pub use types::Log;
pub use utils::{terminal_columns, truncate};

/// Create a Logger backed by an isolated per-thread tracing subscriber
/// with a [`FileLayer`](subscriber::FileLayer) writing into a temporary
/// directory, so that tracing events emitted by logger methods actually
/// reach the log file during tests.
///
/// Returns a [`tracing::dispatcher::DefaultGuard`] that must be kept alive
/// for the duration of the test; dropping it restores the previous
/// thread-local dispatcher.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub(crate) fn isolated_logger(
    debug_level: u8,
) -> (Logger, tempfile::TempDir, tracing::dispatcher::DefaultGuard) {
    use tracing_subscriber::{Layer as _, filter::LevelFilter, layer::SubscriberExt as _};
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let path = tmp.path().join("test.log");
    let header = RunHeader {
        config: std::path::PathBuf::from("apipush.toml"),
        run_file: std::path::PathBuf::from("deploy.run"),
        debug_level,
        dry_run: false,
    };
    let file_layer =
        subscriber::FileLayer::open(&path, &header).expect("failed to create file layer");
    let log = Logger::with_log_file(debug_level, Some(path));
    let subscriber =
        tracing_subscriber::registry().with(file_layer.with_filter(LevelFilter::DEBUG));
    let guard = tracing::dispatcher::set_default(&tracing::Dispatch::new(subscriber));
    (log, tmp, guard)
}

/// In-memory [`Log`] that records every message with its level tag.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryLog {
    debug_level: u8,
    lines: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemoryLog {
    /// Create a log that accepts `detail` messages up to `debug_level`.
    pub(crate) fn new(debug_level: u8) -> Self {
        Self {
            debug_level,
            lines: std::sync::Mutex::default(),
        }
    }

    /// Every recorded line, formatted as `"<level>: <message>"`.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Whether any recorded line contains `needle`.
    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(format!("{level}: {msg}"));
    }
}

#[cfg(test)]
impl Log for MemoryLog {
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
    fn directive(&self, msg: &str, source: Option<&std::path::Path>) {
        let line = source.map_or_else(
            || msg.to_string(),
            |path| format!("{msg} ({})", path.display()),
        );
        self.push("directive", &line);
    }
    fn detail(&self, level: u8, msg: &str) {
        if level <= self.debug_level {
            self.push("detail", msg);
        }
    }
}
