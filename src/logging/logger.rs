//! Structured logger with a numeric debug level.
use std::path::{Path, PathBuf};

use super::subscriber::{DIRECTIVE_TARGET, DRY_RUN_TARGET, STAGE_TARGET};
use super::types::Log;
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
///
/// The `detail` method is **not** included because its signature differs
/// from the `fn(&self, &str)` pattern shared by the display methods.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger writing through [`tracing`].
///
/// All messages are also written to a persistent log file at
/// `$XDG_CACHE_HOME/apipush/<command>.log` (default `~/.cache/apipush/<command>.log`)
/// with timestamps and ANSI codes stripped, regardless of the debug level.
#[derive(Debug)]
pub struct Logger {
    debug_level: u8,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display at the end of the run.  The log
    /// file itself is created by [`init_subscriber`](super::subscriber::init_subscriber);
    /// this constructor does not write to the file.
    #[must_use]
    pub fn new(debug_level: u8, command: &str) -> Self {
        Self::with_log_file(debug_level, log_file_path(command))
    }

    /// Create a logger that reports `log_file` as its log location.
    #[must_use]
    pub const fn with_log_file(debug_level: u8, log_file: Option<PathBuf>) -> Self {
        Self {
            debug_level,
            log_file,
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Log the progress line for one directive.
    ///
    /// The console shows `msg` only; the log file also records `source`.
    pub fn directive(&self, msg: &str, source: Option<&Path>) {
        let source = source.map(|path| path.display().to_string());
        tracing::info!(target: DIRECTIVE_TARGET, source = source.as_deref(), "{msg}");
    }

    /// Log `msg` at debug level if `level` does not exceed the configured
    /// debug level.
    pub fn detail(&self, level: u8, msg: &str) {
        if level <= self.debug_level {
            tracing::debug!("{msg}");
        }
    }

    /// Print where the full log of this run was written.
    pub fn print_log_location(&self) {
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn directive(&self, msg: &str, source: Option<&Path>) {
        self.directive(msg, source);
    }

    fn detail(&self, level: u8, msg: &str) {
        self.detail(level, msg);
    }
}
