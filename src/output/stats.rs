//! Statistics gathered from ledgers and content directories
//!
//! This module provides the numbers shown by `--stats`: how many posts each
//! ledger holds and how much has been saved so far.

use crate::config::{Config, ContentKind};
use crate::ledger::Ledger;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Statistics for one content kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindStatistics {
    /// Which content kind these numbers describe
    pub kind: ContentKind,

    /// Ledger file path
    pub ledger_path: PathBuf,

    /// Distinct post identifiers in the ledger
    pub posts_seen: usize,

    /// Content root directory
    pub content_dir: PathBuf,

    /// Files currently under the content root
    pub files_saved: u64,

    /// Total size of those files in bytes
    pub bytes_saved: u64,
}

/// Ledger statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerStatistics {
    pub kinds: Vec<KindStatistics>,

    /// Configured sections as (key, kind) pairs
    pub sections: Vec<(String, ContentKind)>,
}

impl LedgerStatistics {
    /// Posts seen across all ledgers
    pub fn total_posts(&self) -> usize {
        self.kinds.iter().map(|k| k.posts_seen).sum()
    }
}

/// Loads statistics for every content kind
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// Statistics for media and text; missing ledgers and directories count as empty
pub fn load_ledger_statistics(config: &Config) -> LedgerStatistics {
    let kinds = [ContentKind::Media, ContentKind::Text]
        .into_iter()
        .map(|kind| {
            let ledger = Ledger::new(config.ledger_path(kind));
            let content_dir = PathBuf::from(config.content_dir(kind));
            let (files_saved, bytes_saved) = directory_usage(&content_dir);

            KindStatistics {
                kind,
                ledger_path: ledger.path().to_path_buf(),
                posts_seen: ledger.load().len(),
                content_dir,
                files_saved,
                bytes_saved,
            }
        })
        .collect();

    let sections = config
        .sections
        .iter()
        .map(|s| (s.key.clone(), s.kind))
        .collect();

    LedgerStatistics { kinds, sections }
}

fn directory_usage(dir: &Path) -> (u64, u64) {
    if !dir.is_dir() {
        return (0, 0);
    }

    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .fold((0, 0), |(files, bytes), meta| (files + 1, bytes + meta.len()))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_ledger_statistics(stats: &LedgerStatistics) {
    println!("=== Harvest Statistics ===\n");

    for kind in &stats.kinds {
        println!("{}:", kind.kind);
        println!(
            "  Ledger: {} ({} posts)",
            kind.ledger_path.display(),
            kind.posts_seen
        );
        println!(
            "  Content: {} ({} files, {:.2} MB)",
            kind.content_dir.display(),
            kind.files_saved,
            kind.bytes_saved as f64 / 1024.0 / 1024.0
        );
        println!();
    }

    println!("Sections ({}):", stats.sections.len());
    for (key, kind) in &stats.sections {
        println!("  - {} [{}]", key, kind);
    }
    println!();

    println!("Total posts harvested: {}", stats.total_posts());
}
