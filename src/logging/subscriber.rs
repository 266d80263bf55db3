//! Tracing subscriber for a run: coloured console output plus a per-run log
//! file.
//!
//! Every event is sorted into a [`Channel`] by level and target.  Directive
//! progress has a channel of its own so the log file keeps a complete
//! record of what was sent, including the script each directive came from.
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Level;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};

/// Target for stage headers.
pub(super) const STAGE_TARGET: &str = "apipush::stage";
/// Target for one progress line per directive sent.
pub(super) const DIRECTIVE_TARGET: &str = "apipush::directive";
/// Target for actions skipped by `--dry-run`.
pub(super) const DRY_RUN_TARGET: &str = "apipush::dry_run";

/// Inputs of a run, written at the top of its log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHeader {
    /// Connection configuration file.
    pub config: PathBuf,
    /// Run file being replayed.
    pub run_file: PathBuf,
    /// Effective numeric debug level.
    pub debug_level: u8,
    /// Whether directives are only logged.
    pub dry_run: bool,
}

impl RunHeader {
    fn render(&self) -> String {
        let version =
            option_env!("APIPUSH_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let rule = "=".repeat(42);
        let mode = if self.dry_run { ", dry run" } else { "" };
        format!(
            "{rule}\n\
             apipush {version} {}\n\
             config:   {}\n\
             run file: {}\n\
             debug:    {}{mode}\n\
             {rule}\n",
            format_utc_datetime(),
            self.config.display(),
            self.run_file.display(),
            self.debug_level,
        )
    }
}

/// Where an event belongs, derived from its level and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Stage,
    Directive,
    DryRun,
    Info,
    Debug,
    Warn,
    Error,
}

impl Channel {
    fn of(level: Level, target: &str) -> Self {
        match (level, target) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DIRECTIVE_TARGET) => Self::Directive,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    /// One plain-text log file line.  Directive lines name their script.
    fn file_line(self, ts: &str, msg: &str, source: Option<&str>) -> String {
        let tag = match self {
            Self::Stage => "==> ",
            Self::Directive => "--> ",
            Self::DryRun => "    [dry run] ",
            Self::Info => "    ",
            Self::Debug => "    [debug] ",
            Self::Warn => "    [warn] ",
            Self::Error => "    [error] ",
        };
        match (self, source) {
            (Self::Directive | Self::DryRun, Some(source)) => {
                format!("[{ts}] {tag}{msg}  ({source})")
            }
            _ => format!("[{ts}] {tag}{msg}"),
        }
    }

    fn console_line(self, msg: &str) -> String {
        match self {
            Self::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::Directive => format!("  \x1b[36m->\x1b[0m {msg}"),
            Self::DryRun => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// The `message` and optional `source` fields of an event.
#[derive(Default)]
struct EventFields {
    message: String,
    source: Option<String>,
}

impl EventFields {
    fn of(event: &tracing::Event<'_>) -> Self {
        let mut fields = Self::default();
        event.record(&mut fields);
        fields
    }
}

impl tracing::field::Visit for EventFields {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "source" => self.source = Some(format!("{value:?}")),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "source" => self.source = Some(value.to_string()),
            _ => {}
        }
    }
}

/// Appends every event at `DEBUG` and above to the run's log file, whatever
/// the console verbosity.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate `path`, write `header`, and return a layer appending to it.
    ///
    /// Returns `None` if the file cannot be written.
    pub(super) fn open(path: &Path, header: &RunHeader) -> Option<Self> {
        fs::write(path, header.render()).ok()?;
        let file = fs::OpenOptions::new().append(true).open(path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let fields = EventFields::of(event);
        let line = Channel::of(*metadata.level(), metadata.target()).file_line(
            &format_utc_time(),
            &strip_ansi(&fields.message),
            fields.source.as_deref(),
        );

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// Console [`FormatEvent`](tracing_subscriber::fmt::FormatEvent) for apipush.
struct ConsoleFormat;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let fields = EventFields::of(event);
        let channel = Channel::of(*metadata.level(), metadata.target());
        writeln!(writer, "{}", channel.console_line(&fields.message))
    }
}

/// Install the global subscriber for one run.
///
/// Warnings and errors go to stderr, everything else to stdout.  The log
/// file at `$XDG_CACHE_HOME/apipush/<command>.log` is rewritten with
/// `header` and then receives every event down to `DEBUG`.  Call once,
/// before any logging.
pub fn init_subscriber(verbose: bool, command: &str, header: &RunHeader) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let make_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    let console_layer = fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(make_writer)
        .with_filter(console_level);

    let file_layer = log_file_path(command)
        .and_then(|path| FileLayer::open(&path, header))
        .map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}
