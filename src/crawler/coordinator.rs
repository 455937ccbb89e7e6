//! Crawler coordinator - main harvest orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! a section run, including:
//! - Loading the ledger snapshot once at start
//! - Walking the page range in order and capping posts per page
//! - Skipping posts already in the ledger
//! - Dispatching the rest to the extractor and saver
//! - Appending dispatched posts to the ledger

use crate::config::{Config, ContentKind, CrawlerConfig, LedgerPolicy, SectionEntry};
use crate::content::{ExtractedContent, FileSaver};
use crate::crawler::extractor::{ArticleExtractor, GalleryExtractor};
use crate::crawler::{Extractor, Fetcher, ForumClient, HttpClient, PostId, Saver};
use crate::ledger::{Ledger, SeenPosts};
use crate::state::{PageState, PostOutcome};
use crate::{HarvestError, Result};
use std::ops::RangeInclusive;
use url::Url;

/// Quantity limits applied during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Posts processed per listing page, front of the list first
    pub max_posts_per_page: Option<usize>,

    /// Media items kept per post; enforced by the extractor
    pub max_items_per_post: Option<usize>,
}

impl CrawlLimits {
    /// Reads the limits from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_posts_per_page: config.max_posts_per_page,
            max_items_per_post: config.max_items_per_post,
        }
    }

    /// Truncates a page's post list to the per-page cap, keeping order
    pub fn cap_posts(&self, page: u32, mut ids: Vec<PostId>) -> Vec<PostId> {
        if let Some(max) = self.max_posts_per_page {
            if ids.len() > max {
                tracing::info!("Page {} lists {} posts, keeping the first {}", page, ids.len(), max);
                ids.truncate(max);
            }
        }
        ids
    }
}

/// Tallies of one section run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages_visited: usize,
    pub posts_listed: usize,
    pub posts_skipped: usize,
    pub posts_attempted: usize,
    pub posts_saved: usize,
    pub posts_empty: usize,
    pub posts_failed: usize,
}

impl CrawlReport {
    /// Records the outcome of one post
    pub fn record(&mut self, outcome: PostOutcome) {
        if outcome.is_attempted() {
            self.posts_attempted += 1;
        }

        match outcome {
            PostOutcome::AlreadySeen => self.posts_skipped += 1,
            PostOutcome::Empty => self.posts_empty += 1,
            PostOutcome::Saved => self.posts_saved += 1,
            PostOutcome::Failed => self.posts_failed += 1,
        }
    }

    /// Posts whose content was non-empty and saved
    pub fn success_count(&self) -> usize {
        self.posts_saved
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    fetcher: Box<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
    saver: Box<dyn Saver>,
    ledger: Ledger,
    seen: SeenPosts,
    limits: CrawlLimits,
    policy: LedgerPolicy,
}

impl Coordinator {
    /// Creates a new coordinator and loads the ledger snapshot
    ///
    /// The snapshot is taken once here; posts ledgered during the run are
    /// not re-read until a new coordinator is built.
    pub fn new(
        fetcher: Box<dyn Fetcher>,
        extractor: Box<dyn Extractor>,
        saver: Box<dyn Saver>,
        ledger: Ledger,
        limits: CrawlLimits,
        policy: LedgerPolicy,
    ) -> Self {
        let seen = ledger.load();
        tracing::info!(
            "Ledger {} holds {} posts",
            ledger.path().display(),
            seen.len()
        );

        Self {
            fetcher,
            extractor,
            saver,
            ledger,
            seen,
            limits,
            policy,
        }
    }

    /// Builds the coordinator for one section from configuration
    ///
    /// Wires the HTTP listing client, the extractor matching the section's
    /// content kind, the file saver and the ledger for that kind.
    pub fn from_config(config: &Config, section: &SectionEntry) -> Result<Self> {
        let http = HttpClient::from_config(config)?;
        let base_url = Url::parse(&config.site.base_url)?;
        let limits = CrawlLimits::from_config(&config.crawler);

        let extractor: Box<dyn Extractor> = match section.kind {
            ContentKind::Media => Box::new(GalleryExtractor::new(
                http.clone(),
                base_url.clone(),
                limits.max_items_per_post,
            )),
            ContentKind::Text => Box::new(ArticleExtractor::new(http.clone(), base_url.clone())),
        };

        Ok(Self::new(
            Box::new(ForumClient::new(http.clone(), base_url)),
            extractor,
            Box::new(FileSaver::from_config(http, config)),
            Ledger::new(config.ledger_path(section.kind)),
            limits,
            config.crawler.ledger_policy,
        ))
    }

    /// The ledger snapshot taken at construction
    pub fn seen(&self) -> &SeenPosts {
        &self.seen
    }

    /// Runs the section over an inclusive page range
    ///
    /// Pages are visited in ascending order, posts in listing order, one at a
    /// time. Per-post failures are logged and absorbed; nothing here aborts
    /// the run.
    pub async fn run(&self, section: &SectionEntry, pages: RangeInclusive<u32>) -> CrawlReport {
        tracing::info!(
            "Harvesting '{}' pages {}-{} (max {} posts/page, max {} items/post)",
            section.name,
            pages.start(),
            pages.end(),
            describe_limit(self.limits.max_posts_per_page),
            describe_limit(self.limits.max_items_per_post)
        );

        let start_time = std::time::Instant::now();
        let mut report = CrawlReport::default();

        for page in pages {
            self.process_page(section, page, &mut report).await;
        }

        tracing::info!(
            "Harvest of '{}' finished in {:.2?}: {} saved, {} skipped, {} empty, {} failed",
            section.name,
            start_time.elapsed(),
            report.posts_saved,
            report.posts_skipped,
            report.posts_empty,
            report.posts_failed
        );

        report
    }

    /// Lists one page and handles each retained post
    async fn process_page(&self, section: &SectionEntry, page: u32, report: &mut CrawlReport) {
        let mut state = PageState::Pending;

        let ids = match self.fetcher.list_post_ids(section, page).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!("Failed to list page {} of '{}': {}", page, section.name, e);
                Vec::new()
            }
        };
        state = advance(page, state, PageState::PostsListed);

        let ids = self.limits.cap_posts(page, ids);
        report.pages_visited += 1;
        report.posts_listed += ids.len();

        for id in &ids {
            let outcome = self.process_post(section, id).await;
            tracing::debug!("Post {} -> {}", id, outcome);

            if outcome.should_ledger(self.policy) {
                if let Err(e) = self.ledger.append(id) {
                    tracing::error!("Failed to ledger post {}: {}", id, e);
                }
            }

            report.record(outcome);
        }

        advance(page, state, PageState::Done);
    }

    /// Handles a single post
    async fn process_post(&self, section: &SectionEntry, id: &str) -> PostOutcome {
        if self.seen.contains(id) {
            tracing::info!("Already harvested, skipping: {}", id);
            return PostOutcome::AlreadySeen;
        }

        let content = match self.extractor.extract(section, id).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to extract post {}: {}", id, e);
                ExtractedContent::empty(section.kind)
            }
        };

        if content.is_empty() {
            tracing::info!("Post {} has no content to save", id);
            return PostOutcome::Empty;
        }

        match self.saver.save(&content, section).await {
            Ok(saved) => {
                tracing::info!(
                    "Saved post {} ('{}', {} items) to {}",
                    id,
                    content.title(),
                    saved.items,
                    saved.path.display()
                );
                PostOutcome::Saved
            }
            Err(e) => {
                tracing::error!("Failed to save post {}: {}", id, e);
                PostOutcome::Failed
            }
        }
    }
}

fn advance(page: u32, from: PageState, to: PageState) -> PageState {
    debug_assert!(from.can_transition_to(to), "page {}: {} -> {}", page, from, to);
    tracing::trace!("Page {}: {} -> {}", page, from, to);
    to
}

fn describe_limit(limit: Option<usize>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
}

/// Runs a complete harvest of one section
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `section_key` - Key of the section to harvest
/// * `pages` - Inclusive page range
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The run completed; per-post failures are in the report
/// * `Err(HarvestError)` - The section is unknown or the client could not be built
///
/// # Example
///
/// ```no_run
/// use forum_harvest::config::load_config;
/// use forum_harvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_harvest(&config, "pics", 1..=2).await?;
/// println!("Saved {} posts", report.success_count());
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    config: &Config,
    section_key: &str,
    pages: RangeInclusive<u32>,
) -> Result<CrawlReport> {
    let section = config
        .section(section_key)
        .ok_or_else(|| HarvestError::UnknownSection(section_key.to_string()))?;

    let coordinator = Coordinator::from_config(config, section)?;
    Ok(coordinator.run(section, pages).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{MediaSet, TextDocument};
    use crate::crawler::SaveOutcome;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Serves fixed post lists per page; a missing page is a fetch error
    struct FakeFetcher {
        pages: HashMap<u32, Vec<&'static str>>,
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn list_post_ids(&self, _section: &SectionEntry, page: u32) -> Result<Vec<PostId>> {
            self.pages
                .get(&page)
                .map(|ids| ids.iter().map(|id| id.to_string()).collect())
                .ok_or_else(|| HarvestError::Status {
                    url: format!("page-{}", page),
                    status: 500,
                })
        }
    }

    /// Records extracted ids; ids listed in `empty` yield no content and
    /// ids listed in `broken` fail
    #[derive(Default)]
    struct FakeExtractor {
        calls: Arc<Mutex<Vec<String>>>,
        empty: Vec<&'static str>,
        broken: Vec<&'static str>,
    }

    #[async_trait]
    impl Extractor for FakeExtractor {
        async fn extract(&self, _section: &SectionEntry, id: &str) -> Result<ExtractedContent> {
            self.calls.lock().unwrap().push(id.to_string());

            if self.broken.iter().any(|b| *b == id) {
                return Err(HarvestError::HtmlParse {
                    url: id.to_string(),
                    message: "garbled".to_string(),
                });
            }

            let urls = if self.empty.iter().any(|e| *e == id) {
                Vec::new()
            } else {
                vec![format!("https://img.example.com/{}.jpg", id)]
            };

            Ok(ExtractedContent::Media(MediaSet {
                title: id.to_string(),
                urls,
            }))
        }
    }

    /// Records saved titles; titles listed in `failing` fail to save
    #[derive(Default)]
    struct FakeSaver {
        saved: Arc<Mutex<Vec<String>>>,
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl Saver for FakeSaver {
        async fn save(&self, content: &ExtractedContent, _section: &SectionEntry) -> Result<SaveOutcome> {
            if self.failing.iter().any(|f| *f == content.title()) {
                return Err(HarvestError::Save {
                    title: content.title().to_string(),
                    message: "disk full".to_string(),
                });
            }

            self.saved.lock().unwrap().push(content.title().to_string());
            Ok(SaveOutcome {
                path: PathBuf::from(content.title()),
                items: 1,
            })
        }
    }

    fn media_section() -> SectionEntry {
        SectionEntry {
            key: "pics".to_string(),
            name: "Pictures".to_string(),
            kind: ContentKind::Media,
            url_template: "{base}/list?page={page}".to_string(),
        }
    }

    fn fetcher(pages: Vec<(u32, Vec<&'static str>)>) -> Box<FakeFetcher> {
        Box::new(FakeFetcher {
            pages: pages.into_iter().collect(),
        })
    }

    fn ledger_lines(ledger: &Ledger) -> Vec<String> {
        std::fs::read_to_string(ledger.path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_skips_posts_already_in_ledger() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path().join("crawled.log"));
        ledger.append("A").unwrap();
        ledger.append("B").unwrap();

        let extractor = FakeExtractor::default();
        let calls = extractor.calls.clone();

        let coordinator = Coordinator::new(
            fetcher(vec![(1, vec!["A", "B", "C"])]),
            Box::new(extractor),
            Box::new(FakeSaver::default()),
            ledger.clone(),
            CrawlLimits::default(),
            LedgerPolicy::EveryAttempt,
        );

        let report = coordinator.run(&media_section(), 1..=1).await;

        assert_eq!(*calls.lock().unwrap(), vec!["C"]);
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.posts_skipped, 2);
        assert_eq!(ledger_lines(&ledger), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_per_page_cap_keeps_front_of_list() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path().join("crawled.log"));

        let extractor = FakeExtractor::default();
        let calls = extractor.calls.clone();

        let coordinator = Coordinator::new(
            fetcher(vec![(1, vec!["p1", "p2", "p3", "p4", "p5"])]),
            Box::new(extractor),
            Box::new(FakeSaver::default()),
            ledger.clone(),
            CrawlLimits {
                max_posts_per_page: Some(2),
                max_items_per_post: None,
            },
            LedgerPolicy::EveryAttempt,
        );

        let report = coordinator.run(&media_section(), 1..=1).await;

        assert_eq!(*calls.lock().unwrap(), vec!["p1", "p2"]);
        assert_eq!(report.posts_listed, 2);
        assert_eq!(ledger_lines(&ledger), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_failures_are_absorbed_and_ledgered() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path().join("crawled.log"));

        let saver = FakeSaver {
            failing: vec!["bad-save"],
            ..Default::default()
        };
        let saved = saver.saved.clone();

        let coordinator = Coordinator::new(
            fetcher(vec![(1, vec!["ok", "broken", "empty", "bad-save"])]),
            Box::new(FakeExtractor {
                empty: vec!["empty"],
                broken: vec!["broken"],
                ..Default::default()
            }),
            Box::new(saver),
            ledger.clone(),
            CrawlLimits::default(),
            LedgerPolicy::EveryAttempt,
        );

        let report = coordinator.run(&media_section(), 1..=1).await;

        assert_eq!(*saved.lock().unwrap(), vec!["ok"]);
        assert_eq!(report.posts_saved, 1);
        assert_eq!(report.posts_empty, 2);
        assert_eq!(report.posts_failed, 1);
        assert_eq!(report.posts_attempted, 4);
        assert_eq!(ledger_lines(&ledger), vec!["ok", "broken", "empty", "bad-save"]);
    }

    #[tokio::test]
    async fn test_success_only_policy_ledgers_saved_posts() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path().join("crawled.log"));

        let coordinator = Coordinator::new(
            fetcher(vec![(1, vec!["ok", "empty", "bad-save"])]),
            Box::new(FakeExtractor {
                empty: vec!["empty"],
                ..Default::default()
            }),
            Box::new(FakeSaver {
                failing: vec!["bad-save"],
                ..Default::default()
            }),
            ledger.clone(),
            CrawlLimits::default(),
            LedgerPolicy::SuccessOnly,
        );

        coordinator.run(&media_section(), 1..=1).await;
        assert_eq!(ledger_lines(&ledger), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_listing_failure_does_not_abort_range() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path().join("crawled.log"));

        let extractor = FakeExtractor::default();
        let calls = extractor.calls.clone();

        // Page 2 is missing, so listing it fails
        let coordinator = Coordinator::new(
            fetcher(vec![(1, vec!["a"]), (3, vec!["c"])]),
            Box::new(extractor),
            Box::new(FakeSaver::default()),
            ledger,
            CrawlLimits::default(),
            LedgerPolicy::EveryAttempt,
        );

        let report = coordinator.run(&media_section(), 1..=3).await;

        assert_eq!(*calls.lock().unwrap(), vec!["a", "c"]);
        assert_eq!(report.pages_visited, 3);
        assert_eq!(report.success_count(), 2);
    }

    #[tokio::test]
    async fn test_same_run_does_not_reskip() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::new(dir.path().join("crawled.log"));

        let extractor = FakeExtractor::default();
        let calls = extractor.calls.clone();

        // The same post on two pages is extracted twice within one run
        let coordinator = Coordinator::new(
            fetcher(vec![(1, vec!["dup"]), (2, vec!["dup"])]),
            Box::new(extractor),
            Box::new(FakeSaver::default()),
            ledger.clone(),
            CrawlLimits::default(),
            LedgerPolicy::EveryAttempt,
        );
        coordinator.run(&media_section(), 1..=2).await;
        assert_eq!(calls.lock().unwrap().len(), 2);

        // A fresh coordinator picks it up from the ledger
        let extractor = FakeExtractor::default();
        let calls = extractor.calls.clone();
        let coordinator = Coordinator::new(
            fetcher(vec![(1, vec!["dup"])]),
            Box::new(extractor),
            Box::new(FakeSaver::default()),
            ledger,
            CrawlLimits::default(),
            LedgerPolicy::EveryAttempt,
        );
        let report = coordinator.run(&media_section(), 1..=1).await;

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(report.posts_skipped, 1);
    }

    #[tokio::test]
    async fn test_empty_page_range() {
        let dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(
            fetcher(vec![]),
            Box::new(FakeExtractor::default()),
            Box::new(FakeSaver::default()),
            Ledger::new(dir.path().join("crawled.log")),
            CrawlLimits::default(),
            LedgerPolicy::EveryAttempt,
        );

        #[allow(clippy::reversed_empty_ranges)]
        let report = coordinator.run(&media_section(), 3..=1).await;
        assert_eq!(report, CrawlReport::default());
    }

    #[test]
    fn test_text_content_counts_as_empty_when_blank() {
        let content = ExtractedContent::Text(TextDocument {
            title: "t".to_string(),
            author: "a".to_string(),
            body: String::new(),
        });
        assert!(content.is_empty());
    }

    #[tokio::test]
    async fn test_run_harvest_unknown_section() {
        let config = crate::config::parse_config(
            r#"
[site]
base-url = "https://forum.example.com"

[crawler]

[output]
media-dir = "pic"
text-dir = "literature"
archive-dir = "zips"
media-ledger = "pic.log"
text-ledger = "literature.log"
"#,
        )
        .unwrap();

        let result = run_harvest(&config, "missing", 1..=1).await;
        assert!(matches!(result, Err(HarvestError::UnknownSection(_))));
    }
}
