use serde::Deserialize;
use std::fmt;

/// Default volume ceiling: 2 GiB, the usual artifact upload limit
pub const DEFAULT_VOLUME_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Main configuration structure for Forum-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default, rename = "section")]
    pub sections: Vec<SectionEntry>,
}

impl Config {
    /// Looks up a forum section by its key
    pub fn section(&self, key: &str) -> Option<&SectionEntry> {
        self.sections.iter().find(|s| s.key == key)
    }

    /// Returns the ledger file used for sections of the given kind
    pub fn ledger_path(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Media => &self.output.media_ledger,
            ContentKind::Text => &self.output.text_ledger,
        }
    }

    /// Returns the directory that saved content of the given kind lands in
    pub fn content_dir(&self, kind: ContentKind) -> &str {
        match kind {
            ContentKind::Media => &self.output.media_dir,
            ContentKind::Text => &self.output.text_dir,
        }
    }
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the forum, used for `{base}` in section templates and for
    /// resolving relative post links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Fixed delay before every outbound request and between retries (milliseconds)
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Extra attempts after the first failed request
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of posts processed per listing page
    #[serde(rename = "max-posts-per-page", default)]
    pub max_posts_per_page: Option<usize>,

    /// Maximum number of media items downloaded per post
    #[serde(rename = "max-items-per-post", default)]
    pub max_items_per_post: Option<usize>,

    /// Number of concurrent media downloads within one post
    #[serde(rename = "download-workers", default = "default_download_workers")]
    pub download_workers: usize,

    /// When a dispatched post is written to the ledger
    #[serde(rename = "ledger-policy", default)]
    pub ledger_policy: LedgerPolicy,
}

/// Output location configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for downloaded galleries
    #[serde(rename = "media-dir")]
    pub media_dir: String,

    /// Root directory for saved text documents
    #[serde(rename = "text-dir")]
    pub text_dir: String,

    /// Root directory for produced archives
    #[serde(rename = "archive-dir")]
    pub archive_dir: String,

    /// Ledger file for media sections
    #[serde(rename = "media-ledger")]
    pub media_ledger: String,

    /// Ledger file for text sections
    #[serde(rename = "text-ledger")]
    pub text_ledger: String,

    /// Reflow saved text bodies into reading layout
    #[serde(rename = "format-text", default)]
    pub format_text: bool,
}

/// Archive packaging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Package the section output after a crawl
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Volume ceiling in bytes
    #[serde(rename = "volume-size", default = "default_volume_size")]
    pub volume_size: u64,

    /// Omit empty subdirectories from single archives
    #[serde(rename = "skip-empty-dirs", default = "default_true")]
    pub skip_empty_dirs: bool,

    /// Fixed archive file name; defaults to `<section>_<timestamp>.zip`
    #[serde(rename = "file-name", default)]
    pub file_name: Option<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume_size: DEFAULT_VOLUME_SIZE,
            skip_empty_dirs: true,
            file_name: None,
        }
    }
}

/// A forum section with its listing URL pattern
#[derive(Debug, Clone, Deserialize)]
pub struct SectionEntry {
    /// Short identifier used on the command line (e.g., "pics")
    pub key: String,

    /// Display name, also used as the output subdirectory
    pub name: String,

    /// What kind of content posts in this section carry
    pub kind: ContentKind,

    /// Listing URL with `{base}` and `{page}` placeholders
    #[serde(rename = "url-template")]
    pub url_template: String,
}

impl SectionEntry {
    /// Builds the listing URL for one page of this section
    pub fn listing_url(&self, base_url: &str, page: u32) -> String {
        self.url_template
            .replace("{base}", base_url.trim_end_matches('/'))
            .replace("{page}", &page.to_string())
    }
}

/// Kind of content a forum section holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Image galleries
    Media,
    /// Literary text
    Text,
}

impl ContentKind {
    /// Category directory name used under the archive root
    pub fn archive_category(&self) -> &'static str {
        match self {
            Self::Media => "pictures",
            Self::Text => "literature",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Media => write!(f, "media"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// When a dispatched post identifier is appended to the ledger
///
/// `EveryAttempt` ledgers a post after any processing attempt, including a
/// failed extraction or save, so a crashed or flaky run never re-attempts the
/// same post. `SuccessOnly` ledgers only posts whose content was saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerPolicy {
    #[default]
    EveryAttempt,
    SuccessOnly,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_download_workers() -> usize {
    4
}

fn default_volume_size() -> u64 {
    DEFAULT_VOLUME_SIZE
}

fn default_true() -> bool {
    true
}
