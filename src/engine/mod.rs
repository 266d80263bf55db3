//! Sequential execution of a run file with transaction tracking.
//!
//! The engine consumes run-file lines strictly in order.  Each line is parsed
//! just before it runs, references are expanded into leaves that run before
//! the next line, and the first failure aborts the run.  When a failure
//! happens inside an explicit `SQL/TRANSACTION` block the engine issues a
//! `ROLLBACK` before reporting it.
use crate::backend::{Backend, ExecutionResult, TxControl};
use crate::directive::{Directive, Kind, Parsed, parse_line, run_lines};
use crate::error::RunError;
use crate::logging::{Log, terminal_columns, truncate};
use crate::operations::FileSystemOps;
use crate::resolve::ReferenceResolver;

/// Debug level at which backend responses are logged.
pub const DIAGNOSTIC_LEVEL: u8 = 5;

/// Whether an explicit transaction is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionState {
    /// No explicit transaction; each directive stands alone.
    #[default]
    NoTransaction,
    /// A `SQL/TRANSACTION` was issued and not yet committed.
    InTransaction,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of leaf directives (including transaction markers) executed.
    pub executed: usize,
}

/// Drives one run against one backend.
pub struct ExecutionEngine<'a, B> {
    backend: B,
    fs: &'a dyn FileSystemOps,
    log: &'a dyn Log,
    state: TransactionState,
    executed: usize,
    columns: usize,
}

impl<B: std::fmt::Debug> std::fmt::Debug for ExecutionEngine<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("backend", &self.backend)
            .field("state", &self.state)
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}

impl<'a, B: Backend> ExecutionEngine<'a, B> {
    /// Create an engine in [`TransactionState::NoTransaction`].
    ///
    /// Progress lines are cut to the current terminal width.
    pub fn new(backend: B, fs: &'a dyn FileSystemOps, log: &'a dyn Log) -> Self {
        Self {
            backend,
            fs,
            log,
            state: TransactionState::NoTransaction,
            executed: 0,
            columns: terminal_columns(),
        }
    }

    /// Override the terminal width used to cut progress lines.
    #[must_use]
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// The backend this engine dispatches to.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Consume the engine and return its backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Current transaction state.
    pub const fn state(&self) -> TransactionState {
        self.state
    }

    /// Execute every directive in `text`, the contents of a run file.
    ///
    /// # Errors
    ///
    /// Stops at the first failure and returns:
    /// - [`RunError::Parse`] for a line that does not follow the grammar;
    /// - [`RunError::FileNotFound`] or [`RunError::Io`] for an unreadable reference;
    /// - [`RunError::Configuration`] for a misplaced transaction marker or a
    ///   transaction still open at the end of the file;
    /// - [`RunError::Backend`] or [`RunError::Rollback`] when the backend
    ///   rejects a directive.
    pub fn run(&mut self, text: &str) -> Result<RunSummary, RunError> {
        for line in run_lines(text) {
            let parsed = parse_line(line.text).map_err(|e| RunError::Parse {
                line: line.number,
                message: e.to_string(),
            })?;

            match parsed {
                Parsed::Literal(directive) => self.step(&directive)?,
                Parsed::Reference(reference) => {
                    let leaves = ReferenceResolver::new(self.fs, self.log)
                        .resolve(&reference)
                        .map_err(|e| e.into_run_error(line.number))?;
                    for leaf in &leaves {
                        self.step(leaf)?;
                    }
                }
            }
        }

        if self.state == TransactionState::InTransaction {
            return Err(RunError::Configuration(
                "SQL/TRANSACTION was never followed by SQL/COMMIT".to_string(),
            ));
        }

        self.log
            .info(&format!("Executed {} directive(s)", self.executed));
        Ok(RunSummary {
            executed: self.executed,
        })
    }

    /// Execute one leaf according to the transaction state machine.
    fn step(&mut self, directive: &Directive) -> Result<(), RunError> {
        match (directive.kind, self.state) {
            (Kind::Begin, TransactionState::InTransaction) => {
                return Err(RunError::Configuration(
                    "SQL/TRANSACTION while a transaction is already open".to_string(),
                ));
            }
            (Kind::Commit, TransactionState::NoTransaction) => {
                return Err(RunError::Configuration(
                    "SQL/COMMIT without an open transaction".to_string(),
                ));
            }
            _ => {}
        }

        let description = directive.describe();
        self.log.directive(
            &truncate(&description, self.columns.saturating_sub(3)),
            directive.source.as_deref(),
        );

        let result = match directive.kind {
            Kind::Begin => self.backend.transaction(TxControl::Begin),
            Kind::Commit => self.backend.transaction(TxControl::Commit),
            Kind::Sql | Kind::Api => self.backend.execute(directive),
        };
        self.log
            .detail(DIAGNOSTIC_LEVEL, &result.diagnostic.to_string());

        if !result.success {
            return Err(self.fail(description, &result));
        }

        self.executed += 1;
        match directive.kind {
            Kind::Begin => self.state = TransactionState::InTransaction,
            Kind::Commit => self.state = TransactionState::NoTransaction,
            Kind::Sql | Kind::Api => {}
        }
        Ok(())
    }

    /// Build the error for a failed directive, rolling back first if a
    /// transaction is open.
    fn fail(&mut self, directive: String, result: &ExecutionResult) -> RunError {
        let diagnostic = result.message();

        if self.state == TransactionState::InTransaction {
            self.log.warn("Rolling back transaction");
            let rollback = self.backend.transaction(TxControl::Rollback);
            self.state = TransactionState::NoTransaction;
            if !rollback.success {
                return RunError::Rollback {
                    directive,
                    diagnostic,
                    rollback: rollback.message(),
                };
            }
        }

        RunError::Backend {
            directive,
            diagnostic,
        }
    }
}
