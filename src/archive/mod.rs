//! Size-bounded ZIP packaging
//!
//! A directory whose files fit under the volume ceiling becomes one archive
//! with member names relative to the directory itself. Anything larger is
//! split into `<base>_part<N>.zip` volumes whose member names keep the source
//! directory as their first component, plus a `<base>_volume_info.txt`
//! manifest listing the volumes.
//!
//! Packaging is blocking file I/O; async callers should run it on
//! `tokio::task::spawn_blocking`.

mod manifest;
mod volume;
mod writer;

pub use manifest::VolumeManifest;
pub use volume::{group_into_volumes, needs_volumes, scan_directory, FileSizeRecord, VolumeGroup};
pub use writer::{member_name, ArchiveWriter};

use crate::config::{ArchiveConfig, DEFAULT_VOLUME_SIZE};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised while packaging
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Source directory does not exist: {0}")]
    MissingSource(PathBuf),

    #[error("Source directory has no files: {0}")]
    EmptySource(PathBuf),

    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("ZIP error in {path}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("Failed to write manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for archive operations
pub type ArchiveResult<T> = std::result::Result<T, ArchiveError>;

/// What a successful packaging produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Archive files written, in volume order
    pub volumes: Vec<PathBuf>,

    /// Manifest path, present only for multi-volume output
    pub manifest: Option<PathBuf>,

    /// Files actually added
    pub file_count: usize,

    /// Uncompressed bytes of the files actually added
    pub total_bytes: u64,
}

impl ArchiveReport {
    pub fn is_multi_volume(&self) -> bool {
        self.manifest.is_some()
    }
}

/// Packages directories into ZIP archives
#[derive(Debug, Clone, Copy)]
pub struct Archiver {
    volume_size: u64,
    skip_empty_dirs: bool,
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_SIZE, true)
    }
}

impl Archiver {
    pub fn new(volume_size: u64, skip_empty_dirs: bool) -> Self {
        Self {
            volume_size: volume_size.max(1),
            skip_empty_dirs,
        }
    }

    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self::new(config.volume_size, config.skip_empty_dirs)
    }

    /// Packages `source_dir` into `output_path`
    ///
    /// # Arguments
    ///
    /// * `source_dir` - Directory to package
    /// * `output_path` - Archive path; the volume base name when split
    ///
    /// # Returns
    ///
    /// * `Ok(ArchiveReport)` - Archive or volumes written
    /// * `Err(ArchiveError)` - Nothing to package, or a container could not be written
    pub fn zip_directory(&self, source_dir: &Path, output_path: &Path) -> ArchiveResult<ArchiveReport> {
        if !source_dir.is_dir() {
            return Err(ArchiveError::MissingSource(source_dir.to_path_buf()));
        }

        let start_time = std::time::Instant::now();
        let files = scan_directory(source_dir);
        let total = volume::total_size(&files);

        tracing::info!(
            "Found {} files in {} ({} MB)",
            files.len(),
            source_dir.display(),
            megabytes(total)
        );

        if files.is_empty() {
            tracing::warn!("Nothing to package in {}", source_dir.display());
            return Err(ArchiveError::EmptySource(source_dir.to_path_buf()));
        }

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ArchiveError::Create {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let report = if needs_volumes(&files, self.volume_size) {
            self.write_volumes(source_dir, output_path, &files)?
        } else {
            self.write_single(source_dir, output_path)?
        };

        tracing::info!(
            "Packaged {} files ({} MB) into {} archive(s) in {:.2}s",
            report.file_count,
            megabytes(report.total_bytes),
            report.volumes.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }

    fn write_single(&self, source_dir: &Path, output_path: &Path) -> ArchiveResult<ArchiveReport> {
        let mut writer = ArchiveWriter::create(output_path)?;
        let mut file_count = 0usize;
        let mut total_bytes = 0u64;

        for entry in WalkDir::new(source_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let Some(name) = member_name(entry.path(), source_dir) else {
                continue;
            };

            if entry.file_type().is_dir() {
                if !self.skip_empty_dirs && is_empty_dir(entry.path()) {
                    writer.add_directory(&name)?;
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if writer.add_file(entry.path(), &name, size)? {
                file_count += 1;
                total_bytes += size;

                if file_count % 100 == 0 {
                    tracing::info!(
                        "Added {} files so far ({} MB)",
                        file_count,
                        megabytes(total_bytes)
                    );
                }
            }
        }

        let path = writer.finish()?;
        tracing::info!("Wrote {}", path.display());

        Ok(ArchiveReport {
            volumes: vec![path],
            manifest: None,
            file_count,
            total_bytes,
        })
    }

    fn write_volumes(
        &self,
        source_dir: &Path,
        output_path: &Path,
        files: &[FileSizeRecord],
    ) -> ArchiveResult<ArchiveReport> {
        let groups = group_into_volumes(files, self.volume_size);
        tracing::info!(
            "{} MB exceeds the {} MB ceiling, splitting into {} volumes",
            megabytes(volume::total_size(files)),
            megabytes(self.volume_size),
            groups.len()
        );

        // Member names keep the source directory as their first component
        let base = source_dir.parent().unwrap_or(source_dir);
        let prefix = volume_prefix(output_path);

        let mut volumes = Vec::with_capacity(groups.len());
        let mut file_count = 0usize;
        let mut total_bytes = 0u64;

        for (index, group) in groups.iter().enumerate() {
            let volume_path = PathBuf::from(format!("{}_part{}.zip", prefix, index + 1));
            tracing::info!(
                "Writing volume {}/{}: {}",
                index + 1,
                groups.len(),
                volume_path.display()
            );

            let mut writer = ArchiveWriter::create(&volume_path)?;
            for file in group {
                let Some(name) = member_name(&file.path, base) else {
                    continue;
                };

                if writer.add_file(&file.path, &name, file.size)? {
                    file_count += 1;
                    total_bytes += file.size;
                }
            }

            let written = writer.finish()?;
            let size = std::fs::metadata(&written).map(|m| m.len()).unwrap_or(0);
            tracing::info!("Volume {} done ({} MB)", index + 1, megabytes(size));
            volumes.push(written);
        }

        let manifest_path = PathBuf::from(format!("{}_volume_info.txt", prefix));
        VolumeManifest::new(&volumes, Local::now()).write(&manifest_path)?;

        Ok(ArchiveReport {
            volumes,
            manifest: Some(manifest_path),
            file_count,
            total_bytes,
        })
    }
}

/// Default archive file name: `<key>_<YYYYMMDD>_<HHMMSS>.zip`
pub fn default_archive_name(key: &str, now: DateTime<Local>) -> String {
    format!("{}_{}.zip", key, now.format("%Y%m%d_%H%M%S"))
}

/// Output path without a trailing `.zip`
fn volume_prefix(output_path: &Path) -> String {
    let text = output_path.to_string_lossy();
    text.strip_suffix(".zip").unwrap_or(&text).to_string()
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0 / 1024.0)
}
