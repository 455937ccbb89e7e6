//! Crawler module for forum harvesting
//!
//! This module contains the core harvesting logic, including:
//! - Polite HTTP fetching with a fixed delay and bounded retries
//! - Parsing of listing pages, galleries and text posts
//! - The collaborator traits the coordinator drives
//! - Overall run coordination and ledger bookkeeping
//! - Random section and page selection

mod coordinator;
mod extractor;
mod fetcher;
mod parser;
mod random;
mod traits;

pub use coordinator::{run_harvest, Coordinator, CrawlLimits, CrawlReport};
pub use extractor::{ArticleExtractor, GalleryExtractor};
pub use fetcher::{build_http_client, ForumClient, HttpClient};
pub use parser::{extract_post_links, parse_article, parse_gallery};
pub use random::{pick_fallback_section, pick_random_target, RandomTarget, RANDOM_PAGE_MAX};
pub use traits::{Extractor, Fetcher, PostId, SaveOutcome, Saver};
