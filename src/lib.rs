//! Forum-Harvest: an incremental forum content harvester
//!
//! This crate walks the listing pages of a forum section, extracts image
//! galleries or literary text from each post, saves them to a categorized
//! file tree, remembers every dispatched post in an append-only ledger, and
//! packages the results into size-bounded ZIP volumes.

pub mod archive;
pub mod config;
pub mod content;
pub mod crawler;
pub mod ledger;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Forum-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Retries exhausted for {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Archive error: {0}")]
    Archive(#[from] archive::ArchiveError),

    #[error("Unknown forum section: {0}")]
    UnknownSection(String),

    #[error("Failed to save {title}: {message}")]
    Save { title: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Forum-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use archive::{ArchiveReport, Archiver};
pub use config::Config;
pub use content::ExtractedContent;
pub use crawler::{Coordinator, CrawlLimits, CrawlReport};
pub use ledger::{Ledger, SeenPosts};
pub use state::{PageState, PostOutcome};
