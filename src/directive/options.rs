//! Inline option markers at the top of registration payloads.
//!
//! A report, filter, or script file may start with one or more marker lines
//! of the form `!<name>:<json>`, for example:
//!
//! ```text
//! !auto_update:{"interval": "1 day"}
//! !roles:["admin", "finance"]
//! SELECT region, sum(total) FROM sales GROUP BY region
//! ```
//!
//! The markers are stripped from the payload and collected into an options
//! object keyed by marker name.
use serde_json::{Map, Value};
use thiserror::Error;

/// Character that introduces a marker line.
const MARKER: char = '!';

/// A marker line that could not be parsed.
#[derive(Error, Debug)]
pub enum OptionsError {
    /// The marker has no `:` between its name and value, or the name is empty.
    #[error("malformed option marker {0:?}: expected '!<name>:<json>'")]
    Malformed(String),

    /// The marker value is not valid JSON.
    #[error("option '{name}' is not valid JSON: {source}")]
    InvalidJson {
        /// Marker name.
        name: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Split leading option markers off `content`.
///
/// Returns `None` for the options when the content has no marker lines, and
/// the remaining payload (everything after the last marker line).
///
/// # Errors
///
/// Returns an [`OptionsError`] if a marker line is malformed or its value is
/// not valid JSON.
pub fn extract_options(content: &str) -> Result<(Option<Map<String, Value>>, &str), OptionsError> {
    let mut options = Map::new();
    let mut rest = content;

    loop {
        let (line, remainder) = rest.split_once('\n').unwrap_or((rest, ""));
        let Some(marker) = line.trim().strip_prefix(MARKER) else {
            break;
        };
        let (name, raw) = marker
            .split_once(':')
            .filter(|(name, _)| !name.trim().is_empty())
            .ok_or_else(|| OptionsError::Malformed(line.trim().to_string()))?;
        let name = name.trim().to_string();
        let value: Value = serde_json::from_str(raw.trim()).map_err(|source| {
            OptionsError::InvalidJson {
                name: name.clone(),
                source,
            }
        })?;
        options.insert(name, value);
        rest = remainder;
        if rest.is_empty() {
            break;
        }
    }

    if options.is_empty() {
        Ok((None, content))
    } else {
        Ok((Some(options), rest))
    }
}
