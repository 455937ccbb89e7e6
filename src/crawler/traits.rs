//! Collaborator traits used by the coordinator
//!
//! The coordinator only talks to the site and the file tree through these
//! three seams, so a different forum layout or output target means a new
//! implementation here rather than a change to the crawl loop.

use crate::config::SectionEntry;
use crate::content::ExtractedContent;
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Opaque post identifier as listed on a section page
pub type PostId = String;

/// Lists the posts of one listing page
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the post identifiers of `page` in listing order
    ///
    /// An empty vector means the page has no posts. Errors are absorbed by
    /// the coordinator and treated the same way.
    async fn list_post_ids(&self, section: &SectionEntry, page: u32) -> Result<Vec<PostId>>;
}

/// Turns a post identifier into content
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Fetches and parses one post
    ///
    /// Any per-post item cap is applied here. Errors are absorbed by the
    /// coordinator and treated as empty content.
    async fn extract(&self, section: &SectionEntry, id: &str) -> Result<ExtractedContent>;
}

/// Persists extracted content
#[async_trait]
pub trait Saver: Send + Sync {
    /// Writes `content` under the section's category; `Ok` means persisted
    async fn save(&self, content: &ExtractedContent, section: &SectionEntry) -> Result<SaveOutcome>;
}

/// Where a saved post ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// File (text) or directory (gallery) written
    pub path: PathBuf,

    /// Number of items stored (images, or 1 for a text document)
    pub items: usize,
}
