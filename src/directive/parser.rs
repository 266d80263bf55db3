//! Directive line grammar: `<kind>: <content>`.
use std::path::PathBuf;

use thiserror::Error;

use super::{Directive, Kind, Reference, Subtype};

/// Separator between the kind tag and the content.
pub const SEPARATOR: &str = ": ";

/// Prefix (after uppercasing) that marks a file reference.
const FILE_PREFIX: &str = "FILE/";

/// Outcome of parsing one run-file line.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    /// Content written inline; executes as-is.
    Literal(Directive),
    /// Content is a path that must be resolved first.
    Reference(Reference),
}

/// Reasons a line does not follow the directive grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line has no `": "` separator (this includes blank lines).
    #[error("malformed directive {0:?}: expected '<kind>: <content>'")]
    MissingSeparator(String),

    /// The kind tag is not one of the recognized forms.
    #[error("unknown directive '{0}'")]
    UnknownKind(String),

    /// A `FILE/<TYPE>/<SUBTYPE>` reference names an unsupported subtype.
    #[error("unknown subtype '{subtype}' for '{kind}'")]
    UnknownSubtype {
        /// Kind tag as written.
        kind: String,
        /// Offending subtype.
        subtype: String,
    },

    /// A file reference has no path.
    #[error("'{0}' requires a path")]
    EmptyPath(String),
}

/// Parse one non-comment run-file line.
///
/// The line is split on the first `": "`.  The kind tag is matched
/// case-insensitively; `FILE/<TYPE>[/<SUBTYPE>]` yields a [`Reference`]
/// whose subtype defaults to `raw`.
///
/// # Examples
///
/// ```
/// use apipush_cli::directive::{Kind, Parsed, parse_line};
///
/// let Parsed::Literal(d) = parse_line("sql: SELECT 1").unwrap() else {
///     panic!("expected a literal directive");
/// };
/// assert_eq!(d.kind, Kind::Sql);
/// assert_eq!(d.content, "SELECT 1");
/// ```
///
/// # Errors
///
/// Returns a [`ParseError`] for missing separators, unknown kinds, unknown
/// subtypes, and file references without a path.
pub fn parse_line(line: &str) -> Result<Parsed, ParseError> {
    let (tag, content) = line
        .split_once(SEPARATOR)
        .ok_or_else(|| ParseError::MissingSeparator(line.to_string()))?;
    let tag = tag.trim();
    let upper = tag.to_ascii_uppercase();

    if let Some(rest) = upper.strip_prefix(FILE_PREFIX) {
        return parse_reference(tag, rest, content).map(Parsed::Reference);
    }

    let kind = match upper.as_str() {
        "SQL" => Kind::Sql,
        "API" => Kind::Api,
        "SQL/TRANSACTION" => Kind::Begin,
        "SQL/COMMIT" => Kind::Commit,
        _ => return Err(ParseError::UnknownKind(tag.to_string())),
    };
    Ok(Parsed::Literal(Directive::literal(kind, content)))
}

/// Decompose the part after `FILE/` into a logical type and subtype.
fn parse_reference(tag: &str, rest: &str, content: &str) -> Result<Reference, ParseError> {
    let (type_tag, subtype_tag) = match rest.split_once('/') {
        Some((t, s)) => (t, Some(s)),
        None => (rest, None),
    };

    let kind = match type_tag {
        "SQL" => Kind::Sql,
        "API" => Kind::Api,
        _ => return Err(ParseError::UnknownKind(tag.to_string())),
    };

    let subtype = match subtype_tag {
        None => Subtype::Raw,
        Some(s) => Subtype::from_tag(s)
            .filter(|st| kind == Kind::Sql || !st.is_registration())
            .ok_or_else(|| ParseError::UnknownSubtype {
                kind: tag.to_string(),
                subtype: s.to_ascii_lowercase(),
            })?,
    };

    let path = content.trim();
    if path.is_empty() {
        return Err(ParseError::EmptyPath(tag.to_string()));
    }

    Ok(Reference {
        kind,
        subtype,
        path: PathBuf::from(path),
    })
}
