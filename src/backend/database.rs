//! PostgreSQL backend.
use anyhow::{Context, Result};
use postgres::{Client, NoTls, SimpleQueryMessage};
use serde_json::json;

use super::{Backend, ExecutionResult, registration_document};
use crate::config::DatabaseConfig;
use crate::directive::{Directive, Kind, Subtype};

/// Row counts reported by a statement batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rows {
    /// Rows inserted, updated, or deleted, summed over the batch.
    pub affected: u64,
    /// Rows returned by queries in the batch.
    pub returned: usize,
}

/// A live database connection able to run statement text.
#[cfg_attr(test, mockall::automock)]
pub trait Session {
    /// Run `statement` through the simple-query protocol.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects any statement in the batch or
    /// the connection is lost.
    fn execute(&mut self, statement: &str) -> Result<Rows>;
}

/// [`Session`] over a synchronous [`postgres::Client`].
pub struct PgSession {
    client: Client,
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession").finish_non_exhaustive()
    }
}

impl PgSession {
    /// Connect using `config` and set the session search path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or the
    /// search path cannot be set.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg = postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .user(&config.user)
            .password(&config.password);
        if let Some(database) = &config.database {
            pg.dbname(database);
        }

        let mut client = pg.connect(NoTls).with_context(|| {
            format!(
                "failed to connect to {}@{}:{}",
                config.user, config.host, config.port
            )
        })?;

        client
            .batch_execute(&format!("SET SEARCH_PATH = {}", config.search_path()))
            .context("failed to set search path")?;

        Ok(Self { client })
    }
}

impl Session for PgSession {
    fn execute(&mut self, statement: &str) -> Result<Rows> {
        let messages = self.client.simple_query(statement)?;
        let mut rows = Rows::default();
        for message in messages {
            match message {
                SimpleQueryMessage::Row(_) => rows.returned += 1,
                SimpleQueryMessage::CommandComplete(n) => rows.affected += n,
                _ => {}
            }
        }
        Ok(rows)
    }
}

/// Quote `text` as a SQL string literal.
fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// [`Backend`] that runs SQL directives over a [`Session`].
#[derive(Debug)]
pub struct DatabaseBackend<S> {
    session: S,
    admin_schema: String,
}

impl<S: Session> DatabaseBackend<S> {
    /// Wrap `session`; registration functions are looked up in `admin_schema`.
    pub fn new(session: S, admin_schema: &str) -> Self {
        Self {
            session,
            admin_schema: admin_schema.to_string(),
        }
    }

    /// The statement that registers `directive` as a report, filter, or script.
    #[must_use]
    pub fn registration_statement(&self, directive: &Directive) -> String {
        format!(
            "SELECT {}.register_{}({}::json)",
            self.admin_schema,
            directive.subtype,
            quote_literal(&registration_document(directive).to_string())
        )
    }

    fn run(&mut self, statement: &str) -> ExecutionResult {
        match self.session.execute(statement) {
            Ok(rows) => ExecutionResult::ok(json!({
                "affected": rows.affected,
                "rows": rows.returned,
            })),
            Err(e) => ExecutionResult::failure(format!("{e:#}")),
        }
    }
}

impl<S: Session + std::fmt::Debug> Backend for DatabaseBackend<S> {
    fn execute(&mut self, directive: &Directive) -> ExecutionResult {
        match (directive.kind, directive.subtype) {
            (Kind::Api, _) => {
                ExecutionResult::failure("API directives require an [api] backend")
            }
            (Kind::Begin, _) => self.run("BEGIN"),
            (Kind::Commit, _) => self.run("COMMIT"),
            (Kind::Sql, Subtype::Raw) => self.run(&directive.content),
            (Kind::Sql, _) => {
                let statement = self.registration_statement(directive);
                self.run(&statement)
            }
        }
    }
}
