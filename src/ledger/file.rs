use crate::ledger::{LedgerError, LedgerResult, SeenPosts};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Append-only ledger file, one post identifier per line
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Creates a handle for the ledger at `path`; nothing is read or created yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole ledger into memory
    ///
    /// A missing file yields an empty set. An unreadable file is logged and
    /// also yields an empty set; this never fails. Blank lines are ignored and
    /// duplicate lines collapse.
    pub fn load(&self) -> SeenPosts {
        match fs::read_to_string(&self.path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No ledger at {}, starting empty", self.path.display());
                SeenPosts::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read ledger {}: {}; treating as empty",
                    self.path.display(),
                    e
                );
                SeenPosts::new()
            }
        }
    }

    /// Appends one identifier as a single line
    ///
    /// Empty identifiers, identifiers with line breaks and identifiers with
    /// surrounding whitespace are rejected.
    ///
    /// The line is written with one `write_all` on a file opened in append
    /// mode, so readers never observe half a line. Appending an identifier
    /// that is already present only adds a redundant line.
    pub fn append(&self, id: &str) -> LedgerResult<()> {
        // `load` trims lines, so anything it would alter cannot round-trip
        if id.is_empty() || id.contains(['\n', '\r']) || id.trim() != id {
            return Err(LedgerError::InvalidIdentifier(id.to_string()));
        }

        let wrap = |source| LedgerError::Append {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(wrap)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(wrap)?;

        file.write_all(format!("{}\n", id).as_bytes()).map_err(wrap)?;
        Ok(())
    }
}
