//! Output module for run summaries and packaging bookkeeping
//!
//! This module handles:
//! - Printing the tallies of a harvest run
//! - Resolving where a section's content and archives live
//! - Recording the archives a run produced
//! - Ledger statistics for `--stats`

pub mod stats;

pub use stats::{load_ledger_statistics, print_ledger_statistics, KindStatistics, LedgerStatistics};

use crate::archive::{default_archive_name, ArchiveReport};
use crate::config::{Config, SectionEntry};
use crate::content::sanitize_component;
use crate::crawler::CrawlReport;
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File below the archive root that lists the archives of the last run
pub const ARCHIVE_INDEX_FILE: &str = "created_archives.txt";

/// Prints the tallies of a run to stdout
pub fn print_report(section: &SectionEntry, report: &CrawlReport) {
    println!("=== Harvest of '{}' ({}) ===\n", section.name, section.key);
    println!("  Pages visited: {}", report.pages_visited);
    println!("  Posts listed: {}", report.posts_listed);
    println!("  Already harvested: {}", report.posts_skipped);
    println!("  Attempted: {}", report.posts_attempted);
    println!("  Saved: {}", report.posts_saved);
    println!("  Empty: {}", report.posts_empty);
    println!("  Failed: {}", report.posts_failed);
}

/// Directory that a section's saved content lands in
pub fn section_content_dir(config: &Config, section: &SectionEntry) -> PathBuf {
    Path::new(config.content_dir(section.kind)).join(sanitize_component(&section.name))
}

/// Archive path for a section: `<archive-dir>/<category>/<file name>`
///
/// Uses the configured file name when set, otherwise `<key>_<timestamp>.zip`.
pub fn archive_output_path(config: &Config, section: &SectionEntry, now: DateTime<Local>) -> PathBuf {
    let file_name = config
        .archive
        .file_name
        .clone()
        .unwrap_or_else(|| default_archive_name(&section.key, now));

    Path::new(&config.output.archive_dir)
        .join(section.kind.archive_category())
        .join(file_name)
}

/// Writes the list of archives produced by a run, one path per line
///
/// The file is replaced on every call.
pub fn write_archive_index(path: &Path, report: &ArchiveReport) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    for volume in &report.volumes {
        writeln!(file, "{}", volume.display())?;
    }
    if let Some(manifest) = &report.manifest {
        writeln!(file, "{}", manifest.display())?;
    }

    tracing::info!("Recorded {} archive(s) in {}", report.volumes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_config, ContentKind};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn create_test_config(file_name: Option<&str>) -> Config {
        let archive = file_name
            .map(|n| format!("[archive]\nfile-name = \"{}\"\n", n))
            .unwrap_or_default();

        parse_config(&format!(
            r#"
[site]
base-url = "https://forum.example.com"

[crawler]

[output]
media-dir = "pic"
text-dir = "literature"
archive-dir = "zips"
media-ledger = "logs/pic.log"
text-ledger = "logs/literature.log"

{}
[[section]]
key = "lit"
name = "Long: Stories"
kind = "text"
url-template = "{{base}}/list?page={{page}}"
"#,
            archive
        ))
        .unwrap()
    }

    #[test]
    fn test_section_paths() {
        let config = create_test_config(None);
        let section = config.section("lit").unwrap();
        assert_eq!(section.kind, ContentKind::Text);

        assert_eq!(
            section_content_dir(&config, section),
            PathBuf::from("literature/Long Stories")
        );

        let now = Local.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(
            archive_output_path(&config, section, now),
            PathBuf::from("zips/literature/lit_20240501_080000.zip")
        );
    }

    #[test]
    fn test_configured_archive_name() {
        let config = create_test_config(Some("daily.zip"));
        let section = config.section("lit").unwrap();
        assert_eq!(
            archive_output_path(&config, section, Local::now()),
            PathBuf::from("zips/literature/daily.zip")
        );
    }

    #[test]
    fn test_write_archive_index() {
        let dir = TempDir::new().unwrap();
        let index = dir.path().join("zips").join(ARCHIVE_INDEX_FILE);

        let report = ArchiveReport {
            volumes: vec![PathBuf::from("zips/a_part1.zip"), PathBuf::from("zips/a_part2.zip")],
            manifest: Some(PathBuf::from("zips/a_volume_info.txt")),
            file_count: 3,
            total_bytes: 30,
        };
        write_archive_index(&index, &report).unwrap();

        assert_eq!(
            std::fs::read_to_string(&index).unwrap(),
            "zips/a_part1.zip\nzips/a_part2.zip\nzips/a_volume_info.txt\n"
        );
    }
}
