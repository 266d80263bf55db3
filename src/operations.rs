//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that reference resolution can be
//! unit-tested without touching the real filesystem.  Production code uses
//! [`SystemFileSystemOps`]; tests use `MockFileSystemOps`.

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Abstraction over the filesystem queries used while resolving references.
///
/// Implement this trait to swap in a mock during unit tests, keeping
/// resolution logic independent of real I/O.  The production implementation
/// is [`SystemFileSystemOps`].
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file (not a directory or broken symlink).
    fn is_file(&self, path: &Path) -> bool;

    /// Returns the immediate child paths inside `path`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Read the full contents of the file at `path` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|e| e.map(|entry| entry.path()).map_err(Into::into))
            .collect()
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Mock [`FileSystemOps`] for unit tests.
///
/// Pre-configure files (with contents) and directory listings using the
/// builder-style methods.  Parent directories of every registered file are
/// created implicitly, so a listing only needs to be spelled out when a test
/// wants a specific enumeration order.
///
/// # Example
///
/// ```ignore
/// use apipush_cli::operations::MockFileSystemOps;
///
/// let fs = MockFileSystemOps::new()
///     .with_file("scripts/a.sql", "SELECT 1;")
///     .with_file("scripts/b.sql", "SELECT 2;");
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockFileSystemOps {
    files: std::collections::HashMap<PathBuf, String>,
    dirs: std::collections::HashMap<PathBuf, Vec<PathBuf>>,
}

#[cfg(test)]
impl MockFileSystemOps {
    /// Create an empty mock with nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a regular file with the given contents.
    ///
    /// Every ancestor of `path` is registered as a directory listing it.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: &str) -> Self {
        let p = path.into();
        self.link_into_parent(&p);
        self.files.insert(p, contents.to_string());
        self
    }

    /// Register an empty directory.
    #[must_use]
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let p = path.into();
        self.link_into_parent(&p);
        self.dirs.entry(p).or_default();
        self
    }

    fn link_into_parent(&mut self, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        let parent = if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        };
        let already_known = self.dirs.contains_key(&parent);
        let entries = self.dirs.entry(parent.clone()).or_default();
        if !entries.iter().any(|e| e == path) {
            // Reverse insertion order so tests notice when callers forget to sort.
            entries.insert(0, path.to_path_buf());
        }
        if !already_known && parent != Path::new(".") {
            self.link_into_parent(&parent);
        }
    }
}

#[cfg(test)]
impl FileSystemOps for MockFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.dirs
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("mock: no entries configured for {}", path.display()))
    }

    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn system_ops_read_dir_lists_children() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sql"), "SELECT 1;").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let mut entries = SystemFileSystemOps.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![dir.path().join("a.sql"), dir.path().join("sub")]
        );
    }

    #[test]
    fn system_ops_distinguishes_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.sql");
        std::fs::write(&file, "SELECT 1;").unwrap();

        let ops = SystemFileSystemOps;
        assert!(ops.is_file(&file));
        assert!(!ops.is_dir(&file));
        assert!(ops.is_dir(dir.path()));
        assert!(!ops.exists(&dir.path().join("missing.sql")));
        assert_eq!(ops.read_to_string(&file).unwrap(), "SELECT 1;");
    }

    #[test]
    fn mock_registers_parent_directories() {
        let fs = MockFileSystemOps::new().with_file("db/migrations/001.sql", "CREATE TABLE t ();");

        assert!(fs.is_dir(Path::new("db")));
        assert!(fs.is_dir(Path::new("db/migrations")));
        assert_eq!(
            fs.read_dir(Path::new("db")).unwrap(),
            vec![PathBuf::from("db/migrations")]
        );
        assert!(fs.is_file(Path::new("db/migrations/001.sql")));
    }

    #[test]
    fn mock_read_missing_file_is_not_found() {
        let fs = MockFileSystemOps::new();
        let err = fs.read_to_string(Path::new("nope.sql")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
