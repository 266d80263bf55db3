//! Expansion of `FILE/...` references into leaf directives.
//!
//! A reference path is interpreted, in order, as:
//!
//! 1. a directory: every non-directory descendant becomes a leaf;
//! 2. a glob (the path contains `*`): the final segment is compiled as a
//!    regular expression and matched against the base names of every file
//!    beneath the parent directory;
//! 3. a regular file: its contents become the single leaf.
//!
//! Leaves are always returned sorted by path so that execution order does
//! not depend on the order the platform lists directory entries in.
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use crate::directive::options::{OptionsError, extract_options};
use crate::directive::{Directive, Reference};
use crate::error::RunError;
use crate::logging::Log;
use crate::operations::FileSystemOps;

/// Wildcard marker that turns a reference path into a pattern.
const WILDCARD: char = '*';

/// Errors raised while expanding a reference.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The referenced path (or a glob's parent directory) does not exist.
    #[error("File {} does not exist", .0.display())]
    NotFound(PathBuf),

    /// A directory could not be listed.
    #[error("cannot list directory {}: {reason}", .path.display())]
    ReadDir {
        /// Directory being listed.
        path: PathBuf,
        /// Underlying error, rendered with its context chain.
        reason: String,
    },

    /// A file exists but could not be read.
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A registration payload has malformed option markers.
    #[error("{}: {source}", .path.display())]
    Options {
        /// File whose markers are malformed.
        path: PathBuf,
        /// Marker error.
        source: OptionsError,
    },
}

impl ResolveError {
    /// Convert into the run-level error for the run-file line at `line`.
    #[must_use]
    pub fn into_run_error(self, line: usize) -> RunError {
        match self {
            Self::NotFound(path) => RunError::FileNotFound { path },
            Self::Io { path, source } => RunError::Io { path, source },
            Self::ReadDir { path, reason } => RunError::Io {
                path,
                source: std::io::Error::other(reason),
            },
            err @ Self::Options { .. } => RunError::Parse {
                line,
                message: err.to_string(),
            },
        }
    }
}

/// Compile the final segment of a glob reference.
///
/// Each `*` becomes `.*` and the pattern is anchored to the whole base name;
/// every other character keeps its regular-expression meaning.
///
/// # Errors
///
/// Returns the [`regex::Error`] if the rewritten pattern does not compile.
pub fn glob_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^{}$", pattern.replace(WILDCARD, ".*")))
}

/// Expands references using an injected filesystem.
pub struct ReferenceResolver<'a> {
    fs: &'a dyn FileSystemOps,
    log: &'a dyn Log,
}

impl std::fmt::Debug for ReferenceResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("fs", &self.fs)
            .field("log", &"<dyn Log>")
            .finish()
    }
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver reading through `fs` and reporting through `log`.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystemOps, log: &'a dyn Log) -> Self {
        Self { fs, log }
    }

    /// Expand `reference` into zero or more leaf directives.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] when the path (or a glob's parent) does
    /// not exist, a directory or file cannot be read, or a registration
    /// payload carries malformed option markers.  An uncompilable glob
    /// pattern is logged and yields no leaves instead.
    pub fn resolve(&self, reference: &Reference) -> Result<Vec<Directive>, ResolveError> {
        let path = &reference.path;

        let files = if self.fs.is_dir(path) {
            self.files_under(path)?
        } else if path.to_string_lossy().contains(WILDCARD) {
            self.glob(path)?
        } else if self.fs.is_file(path) {
            vec![path.clone()]
        } else {
            return Err(ResolveError::NotFound(path.clone()));
        };

        self.log.debug(&format!(
            "{} resolved to {} file(s)",
            path.display(),
            files.len()
        ));

        files
            .into_iter()
            .map(|file| self.leaf(reference, file))
            .collect()
    }

    /// Files beneath the parent of a glob whose base name matches its final segment.
    fn glob(&self, path: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        let pattern = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let regex = match glob_regex(&pattern) {
            Ok(re) => re,
            Err(e) => {
                self.log.error(&format!(
                    "invalid pattern '{pattern}' in {}: {e}",
                    path.display()
                ));
                return Ok(Vec::new());
            }
        };

        if !self.fs.is_dir(&parent) {
            return Err(ResolveError::NotFound(parent));
        }

        Ok(self
            .files_under(&parent)?
            .into_iter()
            .filter(|file| {
                file.file_name()
                    .is_some_and(|name| regex.is_match(&name.to_string_lossy()))
            })
            .collect())
    }

    /// Every non-directory descendant of `dir`, sorted by path.
    fn files_under(&self, dir: &Path) -> Result<Vec<PathBuf>, ResolveError> {
        let mut files = Vec::new();
        self.walk(dir, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn walk(&self, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ResolveError> {
        let entries = self.fs.read_dir(dir).map_err(|e| ResolveError::ReadDir {
            path: dir.to_path_buf(),
            reason: format!("{e:#}"),
        })?;
        for entry in entries {
            if self.fs.is_dir(&entry) {
                self.walk(&entry, out)?;
            } else {
                out.push(entry);
            }
        }
        Ok(())
    }

    /// Read `file` into a leaf carrying the reference's kind and subtype.
    fn leaf(&self, reference: &Reference, file: PathBuf) -> Result<Directive, ResolveError> {
        let raw = self.fs.read_to_string(&file).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ResolveError::NotFound(file.clone())
            } else {
                ResolveError::Io {
                    path: file.clone(),
                    source,
                }
            }
        })?;

        let (options, content) = if reference.subtype.is_registration() {
            let (options, body) = extract_options(&raw).map_err(|source| {
                ResolveError::Options {
                    path: file.clone(),
                    source,
                }
            })?;
            (options, body.to_string())
        } else {
            (None, raw)
        };

        Ok(Directive {
            kind: reference.kind,
            subtype: reference.subtype,
            options,
            content,
            source: Some(file),
        })
    }
}
