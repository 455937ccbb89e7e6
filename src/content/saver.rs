//! Saves extracted content into the local file tree
//!
//! Layout:
//! - media: `<media-dir>/<section>/<title>/<title><n><ext>`
//! - text:  `<text-dir>/<section>/<title>.txt`

use crate::config::{Config, SectionEntry};
use crate::content::{format_novel, sanitize_component, ExtractedContent, MediaSet, TextDocument};
use crate::crawler::{HttpClient, SaveOutcome, Saver};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};

/// Writes galleries and text documents below the configured output roots
#[derive(Debug, Clone)]
pub struct FileSaver {
    http: HttpClient,
    media_dir: PathBuf,
    text_dir: PathBuf,
    download_workers: usize,
    format_text: bool,
}

impl FileSaver {
    /// Creates a saver writing below the given roots
    pub fn new(
        http: HttpClient,
        media_dir: impl Into<PathBuf>,
        text_dir: impl Into<PathBuf>,
        download_workers: usize,
    ) -> Self {
        Self {
            http,
            media_dir: media_dir.into(),
            text_dir: text_dir.into(),
            download_workers: download_workers.max(1),
            format_text: false,
        }
    }

    /// Enables reading-layout formatting of saved text bodies
    pub fn with_text_formatting(mut self, enabled: bool) -> Self {
        self.format_text = enabled;
        self
    }

    /// Creates a saver from the output section of the configuration
    pub fn from_config(http: HttpClient, config: &Config) -> Self {
        Self::new(
            http,
            &config.output.media_dir,
            &config.output.text_dir,
            config.crawler.download_workers,
        )
        .with_text_formatting(config.output.format_text)
    }

    /// Downloads every URL of the gallery with at most `download_workers` in flight
    async fn save_media(&self, set: &MediaSet, section: &SectionEntry) -> Result<SaveOutcome> {
        let title = sanitize_component(&set.title);
        let dir = self
            .media_dir
            .join(sanitize_component(&section.name))
            .join(&title);
        tokio::fs::create_dir_all(&dir).await?;

        tracing::info!("Downloading {} items of '{}'", set.urls.len(), set.title);
        let start = std::time::Instant::now();

        // Jobs own their inputs so the pooled futures stay `Send`
        let jobs: Vec<_> = set
            .urls
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, url)| {
                let path = dir.join(format!("{}{}{}", title, index + 1, guess_extension(&url)));
                let http = self.http.clone();
                async move {
                    let result = http.download(&url, &path).await;
                    (url, result)
                }
            })
            .collect();

        let results: Vec<_> = stream::iter(jobs)
            .buffer_unordered(self.download_workers)
            .collect()
            .await;

        let mut stored = 0;
        for (url, result) in results {
            match result {
                Ok(_) => stored += 1,
                Err(e) => tracing::warn!("Failed to download {}: {}", url, e),
            }
        }

        tracing::info!(
            "Stored {}/{} items of '{}' in {:.2}s",
            stored,
            set.urls.len(),
            set.title,
            start.elapsed().as_secs_f64()
        );

        if stored == 0 {
            return Err(HarvestError::Save {
                title: set.title.clone(),
                message: "no item could be downloaded".to_string(),
            });
        }

        Ok(SaveOutcome {
            path: dir,
            items: stored,
        })
    }

    async fn save_text(&self, doc: &TextDocument, section: &SectionEntry) -> Result<SaveOutcome> {
        let dir = self.text_dir.join(sanitize_component(&section.name));
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.txt", sanitize_component(&doc.title)));
        let content = if self.format_text {
            render_text(&TextDocument {
                body: format_novel(&doc.body),
                ..doc.clone()
            })
        } else {
            render_text(doc)
        };
        tokio::fs::write(&path, content).await?;

        tracing::info!("Saved text '{}' to {}", doc.title, path.display());
        Ok(SaveOutcome { path, items: 1 })
    }
}

#[async_trait]
impl Saver for FileSaver {
    async fn save(&self, content: &ExtractedContent, section: &SectionEntry) -> Result<SaveOutcome> {
        match content {
            ExtractedContent::Media(set) => self.save_media(set, section).await,
            ExtractedContent::Text(doc) => self.save_text(doc, section).await,
        }
    }
}

/// Renders a text document as stored on disk
fn render_text(doc: &TextDocument) -> String {
    format!(
        "Title: {}\nAuthor: {}\n\n{}\n",
        doc.title, doc.author, doc.body
    )
}

/// Picks a file extension for a media URL
///
/// Known image markers anywhere in the URL win; otherwise the extension of
/// the URL path is used, falling back to `.jpg`.
pub fn guess_extension(url: &str) -> String {
    for marker in [".gif", ".png", ".jpg", ".jpeg"] {
        if url.contains(marker) {
            return marker.to_string();
        }
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    match Path::new(last_segment).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() && ext.len() <= 5 => format!(".{}", ext),
        _ => ".jpg".to_string(),
    }
}
