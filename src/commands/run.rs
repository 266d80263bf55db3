//! The `apipush` run: check inputs, load the configuration, pick a backend,
//! and drive the run file through the engine.
use std::path::Path;

use anyhow::{Context, Result};

use crate::backend::{self, Backend, DryRunBackend};
use crate::cli::Cli;
use crate::config::Config;
use crate::engine::{ExecutionEngine, RunSummary};
use crate::error::RunError;
use crate::logging::Log;
use crate::operations::{FileSystemOps, SystemFileSystemOps};

/// Fail with [`RunError::FileNotFound`] unless `path` exists.
fn require_file(fs: &dyn FileSystemOps, path: &Path) -> Result<(), RunError> {
    if fs.exists(path) {
        Ok(())
    } else {
        Err(RunError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Load and validate the configuration, reporting any warnings.
///
/// # Errors
///
/// Returns the [`ConfigError`](crate::error::ConfigError) from [`Config::load`].
pub fn load_config(fs: &dyn FileSystemOps, path: &Path, log: &dyn Log) -> Result<Config> {
    let config = Config::load(fs, path)?;
    log.debug(&format!(
        "{} backend configured in {}",
        config.backend.name(),
        path.display()
    ));

    let warnings = config.warnings();
    if !warnings.is_empty() {
        log.warn(&format!(
            "found {} configuration warning(s):",
            warnings.len()
        ));
        for warning in &warnings {
            log.warn(&format!("  {warning}"));
        }
    }
    Ok(config)
}

/// Run `text` against `backend`.
///
/// # Errors
///
/// Returns the first [`RunError`] raised by the engine.
pub fn execute<B: Backend>(
    backend: B,
    text: &str,
    fs: &dyn FileSystemOps,
    log: &dyn Log,
) -> Result<RunSummary, RunError> {
    ExecutionEngine::new(backend, fs, log).run(text)
}

/// Run the command described by `cli`.
///
/// Both files must exist before anything else happens; the backend is
/// connected (or replaced by a dry-run backend) only once the configuration
/// has loaded.
///
/// # Errors
///
/// Returns an error if either file is missing, the configuration is
/// invalid, the backend cannot be reached, or any directive fails.
pub fn run(cli: &Cli, log: &dyn Log) -> Result<RunSummary> {
    let fs = SystemFileSystemOps;

    log.stage(&format!("apipush {}", super::version()));
    require_file(&fs, &cli.config)?;
    require_file(&fs, &cli.run_file)?;

    let config = load_config(&fs, &cli.config, log)?;
    let text = fs
        .read_to_string(&cli.run_file)
        .map_err(|source| RunError::Io {
            path: cli.run_file.clone(),
            source,
        })?;

    log.stage(&format!("Running {}", cli.run_file.display()));
    let summary = if cli.dry_run {
        execute(DryRunBackend::new(log), &text, &fs, log)?
    } else {
        let backend = backend::connect(&config, log)
            .with_context(|| format!("using {}", config.path.display()))?;
        execute(backend, &text, &fs, log)?
    };
    Ok(summary)
}
