//! Run-file directives: the line grammar and the resolved instruction types.
//!
//! A run file is filtered into lines ([`filter`]), each line is parsed into
//! either a literal [`Directive`] or a file [`Reference`] ([`parser`]), and
//! references are later expanded into leaf directives by the
//! [`resolve`](crate::resolve) module.
pub mod filter;
pub mod options;
pub mod parser;

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

pub use filter::{RunLine, run_lines};
pub use parser::{Parsed, parse_line};

/// Logical kind of a directive, normalized to uppercase at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A SQL statement (or a file of statements).
    Sql,
    /// A literal JSON payload for the administrative API.
    Api,
    /// `SQL/TRANSACTION`: open a transaction.
    Begin,
    /// `SQL/COMMIT`: commit the open transaction.
    Commit,
}

impl Kind {
    /// The run-file spelling of this kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Sql => "SQL",
            Self::Api => "API",
            Self::Begin => "SQL/TRANSACTION",
            Self::Commit => "SQL/COMMIT",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Optional refinement of a `FILE/SQL/<SUBTYPE>` reference.
///
/// Anything other than [`Subtype::Raw`] turns the file contents into a
/// registration call rather than a statement to run directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Subtype {
    /// Execute the content as-is.
    #[default]
    Raw,
    /// Register the content as a report.
    Report,
    /// Register the content as a filter.
    Filter,
    /// Register the content as a script.
    Script,
}

impl Subtype {
    /// Parse a subtype tag case-insensitively.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "raw" => Some(Self::Raw),
            "report" => Some(Self::Report),
            "filter" => Some(Self::Filter),
            "script" => Some(Self::Script),
            _ => None,
        }
    }

    /// The lowercase tag, as used in registration action names.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Report => "report",
            Self::Filter => "filter",
            Self::Script => "script",
        }
    }

    /// Whether this subtype repackages content into a registration call.
    #[must_use]
    pub const fn is_registration(self) -> bool {
        !matches!(self, Self::Raw)
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One resolved instruction, ready to be dispatched to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// Logical kind.
    pub kind: Kind,
    /// Subtype; only meaningful for [`Kind::Sql`].
    pub subtype: Subtype,
    /// Inline option metadata parsed from `!name:{json}` marker lines.
    pub options: Option<Map<String, Value>>,
    /// Literal payload: SQL text or a JSON document.
    pub content: String,
    /// File the content was read from, when it came from a reference.
    pub source: Option<PathBuf>,
}

impl Directive {
    /// A directive whose content was written inline in the run file.
    #[must_use]
    pub fn literal(kind: Kind, content: impl Into<String>) -> Self {
        Self {
            kind,
            subtype: Subtype::Raw,
            options: None,
            content: content.into(),
            source: None,
        }
    }

    /// Registration name: the source file stem, or `"inline"`.
    #[must_use]
    pub fn name(&self) -> String {
        self.source
            .as_deref()
            .and_then(Path::file_stem)
            .map_or_else(|| "inline".to_string(), |s| s.to_string_lossy().into_owned())
    }

    /// One-line human-readable description used in progress and error output.
    #[must_use]
    pub fn describe(&self) -> String {
        let first_line = self.content.lines().next().unwrap_or_default();
        match (self.kind, self.subtype) {
            (Kind::Begin, _) => "Starting transaction".to_string(),
            (Kind::Commit, _) => "Committing transaction".to_string(),
            (Kind::Api, _) => format!("Calling API: {first_line}"),
            (Kind::Sql, Subtype::Raw) => format!("Running SQL: {first_line}"),
            (Kind::Sql, subtype) => format!("Registering {subtype}: {}", self.name()),
        }
    }
}

/// A `FILE/<TYPE>[/<SUBTYPE>]` directive whose content is a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Logical type every resolved leaf inherits.
    pub kind: Kind,
    /// Subtype every resolved leaf inherits.
    pub subtype: Subtype,
    /// File, directory, or glob pattern to expand.
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtype_from_tag_is_case_insensitive() {
        assert_eq!(Subtype::from_tag("REPORT"), Some(Subtype::Report));
        assert_eq!(Subtype::from_tag("Filter"), Some(Subtype::Filter));
        assert_eq!(Subtype::from_tag("raw"), Some(Subtype::Raw));
        assert_eq!(Subtype::from_tag("view"), None);
    }

    #[test]
    fn describe_uses_first_line_of_sql() {
        let d = Directive::literal(Kind::Sql, "SELECT 1\nFROM dual");
        assert_eq!(d.describe(), "Running SQL: SELECT 1");
    }

    #[test]
    fn describe_registration_uses_file_stem() {
        let d = Directive {
            kind: Kind::Sql,
            subtype: Subtype::Report,
            options: None,
            content: "SELECT * FROM sales".to_string(),
            source: Some(PathBuf::from("reports/monthly_sales.sql")),
        };
        assert_eq!(d.describe(), "Registering report: monthly_sales");
    }

    #[test]
    fn name_defaults_to_inline() {
        let d = Directive::literal(Kind::Api, "{}");
        assert_eq!(d.name(), "inline");
    }

    #[test]
    fn kind_display_matches_run_file_spelling() {
        assert_eq!(Kind::Begin.to_string(), "SQL/TRANSACTION");
        assert_eq!(Kind::Commit.to_string(), "SQL/COMMIT");
    }
}
