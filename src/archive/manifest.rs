use crate::archive::{ArchiveError, ArchiveResult};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Plain-text companion listing the volumes of a split archive
#[derive(Debug, Clone)]
pub struct VolumeManifest {
    volumes: Vec<String>,
    created: DateTime<Local>,
}

impl VolumeManifest {
    /// Builds a manifest from volume paths, keeping only their file names
    pub fn new(volumes: &[PathBuf], created: DateTime<Local>) -> Self {
        let volumes = volumes
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.display().to_string())
            })
            .collect();

        Self { volumes, created }
    }

    pub fn render(&self) -> String {
        let mut out = format!("Total volumes: {}\n", self.volumes.len());
        for (index, name) in self.volumes.iter().enumerate() {
            out.push_str(&format!("Volume {}: {}\n", index + 1, name));
        }
        out.push_str(&format!(
            "Created: {}\n",
            self.created.format("%Y-%m-%d %H:%M:%S")
        ));
        out
    }

    pub fn write(&self, path: &Path) -> ArchiveResult<()> {
        std::fs::write(path, self.render()).map_err(|source| ArchiveError::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}
