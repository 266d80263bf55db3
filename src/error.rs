//! Domain-specific error types for the run engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`ConfigError`], [`RunError`])
//! while the command handler at the CLI boundary converts them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! RunError
//! ├── FileNotFound       - config, run file, or a referenced path
//! ├── Parse              - malformed directive line
//! ├── Configuration      - transaction BEGIN/COMMIT misuse
//! ├── Backend            - statement or API call failure
//! ├── Rollback           - failure whose ROLLBACK also failed
//! ├── Connect            - backend session could not be established
//! ├── Io                 - a path exists but could not be read
//! └── Config(ConfigError) - configuration file loading and validation
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Fatal error that aborts a run.
///
/// Every variant terminates the process with a non-zero exit status; only
/// the transaction-aware path in the engine attempts any recovery (a
/// `ROLLBACK`) before surfacing one of these.
#[derive(Error, Debug)]
pub enum RunError {
    /// The config file, the run file, or a referenced path does not exist.
    #[error("File {} does not exist", .path.display())]
    FileNotFound {
        /// Path that could not be found.
        path: PathBuf,
    },

    /// A run-file line does not follow the directive grammar.
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based run-file line number.
        line: usize,
        /// Human-readable description of the problem.
        message: String,
    },

    /// Transaction control used in the wrong state.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend reported a failure for a directive.
    #[error("{directive} failed: {diagnostic}")]
    Backend {
        /// One-line description of the failing directive.
        directive: String,
        /// Error description returned by the backend.
        diagnostic: String,
    },

    /// A directive failed inside a transaction and the `ROLLBACK` failed too.
    #[error("{directive} failed: {diagnostic}; rollback also failed: {rollback}")]
    Rollback {
        /// One-line description of the failing directive.
        directive: String,
        /// Error description of the original failure.
        diagnostic: String,
        /// Error description of the failed rollback.
        rollback: String,
    },

    /// The backend session could not be established.
    #[error("Could not connect to the {backend} backend: {reason}")]
    Connect {
        /// Backend variant name (`"database"` or `"api"`).
        backend: &'static str,
        /// Underlying error, rendered with its context chain.
        reason: String,
    },

    /// An I/O error occurred while reading a path that exists.
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that arise from configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading the config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected shape.
    #[error("Invalid TOML syntax in {file}: {message}")]
    InvalidSyntax {
        /// Path to the offending file.
        file: String,
        /// Parser error message.
        message: String,
    },

    /// Neither a `[database]` nor an `[api]` table is present.
    #[error("Missing backend: expected a [database] or [api] table")]
    MissingBackend,

    /// Both a `[database]` and an `[api]` table are present.
    #[error("Ambiguous backend: only one of [database] or [api] may be configured")]
    AmbiguousBackend,

    /// A field has an unusable value.
    #[error("Invalid value for '{field}': {message}")]
    Invalid {
        /// Dotted field name (e.g. `database.port`).
        field: String,
        /// Human-readable reason.
        message: String,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // RunError
    // -----------------------------------------------------------------------

    #[test]
    fn file_not_found_display() {
        let e = RunError::FileNotFound {
            path: PathBuf::from("scripts/missing.sql"),
        };
        assert_eq!(e.to_string(), "File scripts/missing.sql does not exist");
    }

    #[test]
    fn parse_error_display() {
        let e = RunError::Parse {
            line: 4,
            message: "unknown directive 'SQLX'".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Parse error on line 4: unknown directive 'SQLX'"
        );
    }

    #[test]
    fn configuration_error_display() {
        let e = RunError::Configuration("transaction already open".to_string());
        assert_eq!(
            e.to_string(),
            "Configuration error: transaction already open"
        );
    }

    #[test]
    fn backend_error_display() {
        let e = RunError::Backend {
            directive: "Running SQL: INSERT INTO t".to_string(),
            diagnostic: "duplicate key".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Running SQL: INSERT INTO t failed: duplicate key"
        );
    }

    #[test]
    fn rollback_error_reports_both_failures() {
        let e = RunError::Rollback {
            directive: "Running SQL: INSERT".to_string(),
            diagnostic: "constraint violated".to_string(),
            rollback: "connection reset".to_string(),
        };
        let text = e.to_string();
        assert!(text.contains("constraint violated"));
        assert!(text.contains("connection reset"));
    }

    #[test]
    fn io_error_has_source() {
        use std::error::Error as StdError;
        let e = RunError::Io {
            path: PathBuf::from("/run.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/run.txt"));
    }

    #[test]
    fn config_error_is_transparent() {
        let e: RunError = ConfigError::MissingBackend.into();
        assert_eq!(
            e.to_string(),
            "Missing backend: expected a [database] or [api] table"
        );
    }

    // -----------------------------------------------------------------------
    // ConfigError
    // -----------------------------------------------------------------------

    #[test]
    fn config_error_invalid_display() {
        let e = ConfigError::Invalid {
            field: "database.port".to_string(),
            message: "must be non-zero".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Invalid value for 'database.port': must be non-zero"
        );
    }

    #[test]
    fn config_error_io_display() {
        let e = ConfigError::Io {
            path: "deploy.toml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.to_string().contains("deploy.toml"));
        assert!(e.to_string().contains("IO error reading config file"));
    }

    // -----------------------------------------------------------------------
    // Send + Sync bounds
    // -----------------------------------------------------------------------

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<RunError>();
        assert_send_sync::<ConfigError>();
    }

    #[test]
    fn run_error_converts_to_anyhow() {
        let e = RunError::Configuration("SQL/COMMIT without an open transaction".to_string());
        let _anyhow_err: anyhow::Error = e.into();
    }
}
