//! Directory scanning and volume grouping
//!
//! Files are grouped largest first. A file bigger than the ceiling gets a
//! volume of its own; the rest are packed greedily until adding the next file
//! would cross 90% of the ceiling.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A regular file found under the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSizeRecord {
    pub path: PathBuf,
    pub size: u64,
}

/// Files destined for one volume
pub type VolumeGroup = Vec<FileSizeRecord>;

/// Lists every regular file below `root` with its size
///
/// Entries that cannot be read or sized are logged and skipped. The walk is
/// sorted by file name so the result is stable across platforms.
pub fn scan_directory(root: &Path) -> Vec<FileSizeRecord> {
    let mut records = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        match entry.metadata() {
            Ok(meta) => records.push(FileSizeRecord {
                path: entry.into_path(),
                size: meta.len(),
            }),
            Err(e) => tracing::warn!("Cannot size {}: {}", entry.path().display(), e),
        }
    }

    records
}

/// Sum of all file sizes
pub fn total_size(files: &[FileSizeRecord]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

/// Returns true if the files cannot go into a single archive under `ceiling`
pub fn needs_volumes(files: &[FileSizeRecord], ceiling: u64) -> bool {
    total_size(files) > ceiling || files.iter().any(|f| f.size > ceiling)
}

/// Partitions files into volume groups
///
/// Every input file lands in exactly one group and no group is empty.
pub fn group_into_volumes(files: &[FileSizeRecord], ceiling: u64) -> Vec<VolumeGroup> {
    let soft_limit = ceiling - ceiling / 10;

    let mut sorted = files.to_vec();
    sorted.sort_by(|a, b| b.size.cmp(&a.size));

    let mut groups = Vec::new();
    let mut current: VolumeGroup = Vec::new();
    let mut current_size = 0u64;

    for file in sorted {
        if file.size > ceiling {
            if !current.is_empty() {
                groups.push(std::mem::take(&mut current));
                current_size = 0;
            }
            groups.push(vec![file]);
            continue;
        }

        if current_size + file.size > soft_limit && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
            current_size = 0;
        }

        current_size += file.size;
        current.push(file);
    }

    if !current.is_empty() {
        groups.push(current);
    }

    groups
}
