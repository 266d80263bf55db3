//! Core logging types: the [`Log`] trait.
use std::path::Path;

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) writes through [`tracing`]; tests use an
/// in-memory implementation so the engine can be exercised without a global
/// subscriber.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Log the progress line for a directive about to be sent, with the
    /// script it was read from when it came from a file reference.
    fn directive(&self, msg: &str, source: Option<&Path>);
    /// Log a message gated on the numeric debug level given on the command
    /// line: it is emitted only when `level` is at or below that level.
    fn detail(&self, level: u8, msg: &str);
}
