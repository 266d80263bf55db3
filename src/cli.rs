//! Command-line interface: positional config and run-file paths plus flags.
use std::path::PathBuf;

use clap::Parser;

use crate::logging::RunHeader;

/// Replay a run file of SQL and API directives against a database or API.
#[derive(Parser, Debug)]
#[command(
    name = "apipush",
    about = "Replay a run file of SQL and API directives against a database or admin API",
    version = option_env!("APIPUSH_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    /// Connection configuration (TOML with a [database] or [api] table)
    pub config: PathBuf,

    /// Run file listing the directives to execute
    pub run_file: PathBuf,

    /// Numeric debug level; backend responses are shown from level 5
    #[arg(default_value_t = 0)]
    pub debug_level: u8,

    /// Enable verbose output (debug level at least 1)
    #[arg(short, long)]
    pub verbose: bool,

    /// Log each directive instead of sending it
    #[arg(short = 'd', long)]
    pub dry_run: bool,
}

impl Cli {
    /// The debug level after applying `--verbose`.
    #[must_use]
    pub fn effective_debug_level(&self) -> u8 {
        if self.verbose {
            self.debug_level.max(1)
        } else {
            self.debug_level
        }
    }

    /// The inputs of this run, for the log file header.
    #[must_use]
    pub fn run_header(&self) -> RunHeader {
        RunHeader {
            config: self.config.clone(),
            run_file: self.run_file.clone(),
            debug_level: self.effective_debug_level(),
            dry_run: self.dry_run,
        }
    }
}
