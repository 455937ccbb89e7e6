//! Crawl ledger for cross-run deduplication
//!
//! This module owns the only state that survives between runs: an
//! append-only, newline-delimited file of post identifiers that have already
//! been dispatched. A run loads the file once at start into a [`SeenPosts`]
//! set and consults that set for every listed post; the file is not re-read
//! mid-run.

mod file;

pub use file::Ledger;

use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while appending to the ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to append to ledger {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Identifier is empty or has line breaks or surrounding whitespace: {0:?}")]
    InvalidIdentifier(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// In-memory snapshot of the ledger taken at run start
#[derive(Debug, Clone, Default)]
pub struct SeenPosts {
    ids: HashSet<String>,
}

impl SeenPosts {
    /// Creates an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the identifier was already dispatched by an earlier run
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of distinct identifiers
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no identifier has been recorded
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SeenPosts {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}
