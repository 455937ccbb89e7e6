use crate::archive::{ArchiveError, ArchiveResult};
use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One deflate-compressed ZIP container being written
pub struct ArchiveWriter {
    path: PathBuf,
    zip: ZipWriter<File>,
}

impl ArchiveWriter {
    /// Creates (or truncates) the container at `path`
    pub fn create(path: &Path) -> ArchiveResult<Self> {
        let file = File::create(path).map_err(|source| ArchiveError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            zip: ZipWriter::new(file),
        })
    }

    /// Adds one file under `name`
    ///
    /// Returns `Ok(false)` when the source file could not be read; the
    /// partial entry is discarded and the container stays usable. Errors
    /// from the container itself are returned.
    pub fn add_file(&mut self, source: &Path, name: &str, size: u64) -> ArchiveResult<bool> {
        let mut input = match File::open(source) {
            Ok(f) => f,
            Err(e) => {
                tracing::error!("Failed to open {}: {}", source.display(), e);
                return Ok(false);
            }
        };

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(size >= u64::from(u32::MAX));

        self.zip
            .start_file(name.to_string(), options)
            .map_err(|source| self.zip_error(source))?;

        if let Err(e) = io::copy(&mut input, &mut self.zip) {
            tracing::error!("Failed to add {}: {}", source.display(), e);
            self.zip.abort_file().map_err(|source| self.zip_error(source))?;
            return Ok(false);
        }

        Ok(true)
    }

    /// Adds an explicit directory entry
    pub fn add_directory(&mut self, name: &str) -> ArchiveResult<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip
            .add_directory(name.to_string(), options)
            .map_err(|source| self.zip_error(source))
    }

    /// Writes the central directory and closes the container
    pub fn finish(self) -> ArchiveResult<PathBuf> {
        let path = self.path;
        self.zip.finish().map_err(|source| ArchiveError::Zip {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn zip_error(&self, source: zip::result::ZipError) -> ArchiveError {
        ArchiveError::Zip {
            path: self.path.clone(),
            source,
        }
    }
}

/// Member name of `path` relative to `base`, with `/` separators
pub fn member_name(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;

    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
