//! Backend adapters that carry out resolved directives.
//!
//! A run talks to exactly one [`Backend`], chosen once at startup from the
//! configuration: a PostgreSQL session ([`DatabaseBackend`]), the remote
//! administrative API ([`ApiBackend`]), or, with `--dry-run`, a
//! [`DryRunBackend`] that only logs.
pub mod api;
pub mod database;
pub mod dry_run;

use std::fmt;

use serde_json::{Map, Value, json};

use crate::config::{BackendConfig, Config};
use crate::directive::{Directive, Kind};
use crate::error::RunError;
use crate::logging::Log;

pub use api::{ApiBackend, Transport, UreqTransport};
pub use database::{DatabaseBackend, PgSession, Rows, Session};
pub use dry_run::DryRunBackend;

/// Outcome of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// Whether the backend accepted the directive.
    pub success: bool,
    /// Response payload on success, or an error description on failure.
    pub diagnostic: Value,
}

impl ExecutionResult {
    /// A successful result carrying `diagnostic`.
    #[must_use]
    pub const fn ok(diagnostic: Value) -> Self {
        Self {
            success: true,
            diagnostic,
        }
    }

    /// A failed result with a plain-text description.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::failure_with(Value::String(message.into()))
    }

    /// A failed result carrying a structured payload.
    #[must_use]
    pub const fn failure_with(diagnostic: Value) -> Self {
        Self {
            success: false,
            diagnostic,
        }
    }

    /// The diagnostic rendered as a single line of text.
    ///
    /// String diagnostics are returned unquoted; an object with a `message`
    /// string field yields that message; anything else is serialized JSON.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.diagnostic {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| self.diagnostic.to_string(), str::to_string),
            other => other.to_string(),
        }
    }
}

/// Transaction control statements issued by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxControl {
    /// Open a transaction.
    Begin,
    /// Commit the open transaction.
    Commit,
    /// Abandon the open transaction.
    Rollback,
}

impl TxControl {
    /// The literal SQL statement for this control.
    #[must_use]
    pub const fn statement(self) -> &'static str {
        match self {
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Rollback => "ROLLBACK",
        }
    }
}

impl fmt::Display for TxControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.statement())
    }
}

/// A destination for directives.
///
/// Implementations block until the call completes and never retry.
pub trait Backend: fmt::Debug {
    /// Carry out one leaf directive.
    fn execute(&mut self, directive: &Directive) -> ExecutionResult;

    /// Issue a transaction control statement.
    ///
    /// The default sends the literal statement as a raw SQL directive.
    fn transaction(&mut self, control: TxControl) -> ExecutionResult {
        self.execute(&Directive::literal(Kind::Sql, control.statement()))
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn execute(&mut self, directive: &Directive) -> ExecutionResult {
        (**self).execute(directive)
    }

    fn transaction(&mut self, control: TxControl) -> ExecutionResult {
        (**self).transaction(control)
    }
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn execute(&mut self, directive: &Directive) -> ExecutionResult {
        (**self).execute(directive)
    }

    fn transaction(&mut self, control: TxControl) -> ExecutionResult {
        (**self).transaction(control)
    }
}

/// The document sent when registering a report, filter, or script.
#[must_use]
pub fn registration_document(directive: &Directive) -> Value {
    json!({
        "name": directive.name(),
        "content": directive.content,
        "options": directive.options.clone().unwrap_or_else(Map::new),
    })
}

/// Open the backend selected by `config`.
///
/// # Errors
///
/// Returns [`RunError::Connect`] if the database connection or the API
/// login fails.
pub fn connect(config: &Config, log: &dyn Log) -> Result<Box<dyn Backend>, RunError> {
    match &config.backend {
        BackendConfig::Database(db) => {
            log.info(&format!(
                "Connecting to database {}@{}:{}",
                db.user, db.host, db.port
            ));
            let session = PgSession::connect(db).map_err(|e| RunError::Connect {
                backend: "database",
                reason: format!("{e:#}"),
            })?;
            log.debug(&format!("search path set to {}", db.search_path()));
            Ok(Box::new(DatabaseBackend::new(session, &db.admin_schema)))
        }
        BackendConfig::Api(api) => {
            log.info(&format!("Logging in to {} as {}", api.url, api.username));
            let transport = UreqTransport::new(&api.url, api.timeout());
            let backend = ApiBackend::login(transport, api).map_err(|e| RunError::Connect {
                backend: "api",
                reason: format!("{e:#}"),
            })?;
            Ok(Box::new(backend))
        }
    }
}
