//! Configuration module for Forum-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use forum_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Request delay: {}ms", config.crawler.request_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ArchiveConfig, Config, ContentKind, CrawlerConfig, LedgerPolicy, OutputConfig, SectionEntry,
    SiteConfig, DEFAULT_VOLUME_SIZE,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
