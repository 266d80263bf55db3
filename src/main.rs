//! `apipush` binary: parse arguments, start logging, and run.
use std::process::ExitCode;

use apipush_cli::{cli, commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();

    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    let debug_level = args.effective_debug_level();
    logging::init_subscriber(debug_level > 0, "apipush", &args.run_header());
    let log = logging::Logger::new(debug_level, "apipush");

    let result = commands::run(&args, &log);
    log.print_log_location();

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
