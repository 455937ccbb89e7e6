//! Forum-Harvest main entry point
//!
//! This is the command-line interface for the forum content harvester.

use chrono::Local;
use clap::Parser;
use forum_harvest::archive::Archiver;
use forum_harvest::config::{load_config_with_hash, Config, ContentKind, SectionEntry};
use forum_harvest::content::format_path;
use forum_harvest::crawler::{pick_fallback_section, pick_random_target, Coordinator};
use forum_harvest::output::{
    archive_output_path, load_ledger_statistics, print_ledger_statistics, print_report,
    section_content_dir, write_archive_index, ARCHIVE_INDEX_FILE,
};
use forum_harvest::{ArchiveReport, HarvestError};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Forum-Harvest: an incremental forum content harvester
///
/// Walks the listing pages of a forum section, saves image galleries or
/// literary text from every post not harvested before, and packages the
/// result into size-bounded ZIP archives.
#[derive(Parser, Debug)]
#[command(name = "forum-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental forum content harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Key of the forum section to harvest (defaults to the first configured)
    #[arg(long, env = "HARVEST_SECTION")]
    section: Option<String>,

    /// First listing page to visit
    #[arg(long, env = "HARVEST_START_PAGE", default_value_t = 1)]
    start_page: u32,

    /// Last listing page to visit (inclusive)
    #[arg(long, env = "HARVEST_END_PAGE", default_value_t = 1)]
    end_page: u32,

    /// Override the maximum number of posts processed per page
    #[arg(long, env = "HARVEST_MAX_POSTS")]
    max_posts: Option<usize>,

    /// Override the maximum number of media items kept per post
    #[arg(long, env = "HARVEST_MAX_ITEMS")]
    max_items: Option<usize>,

    /// Harvest one random page (1-10) of a random section, falling back to a
    /// text section when a media run saves nothing
    #[arg(long, env = "HARVEST_RANDOM", conflicts_with_all = ["section", "dry_run"])]
    random: bool,

    /// Skip packaging after the crawl
    #[arg(long)]
    no_archive: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "package", "format"])]
    dry_run: bool,

    /// Show ledger statistics and exit
    #[arg(long, conflicts_with_all = ["dry_run", "package", "format"])]
    stats: bool,

    /// Package an existing directory into the archive root and exit
    #[arg(long, value_name = "DIR", conflicts_with_all = ["dry_run", "stats", "format"])]
    package: Option<PathBuf>,

    /// Reflow a saved text file, or every text file below a directory, into
    /// `<name>_formatted.txt` siblings and exit
    #[arg(long, value_name = "PATH", conflicts_with_all = ["dry_run", "stats", "package", "random"])]
    format: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Command-line caps win over the file
    if cli.max_posts.is_some() {
        config.crawler.max_posts_per_page = cli.max_posts;
    }
    if cli.max_items.is_some() {
        config.crawler.max_items_per_post = cli.max_items;
    }

    // Handle different modes
    if cli.stats {
        handle_stats(&config);
    } else if let Some(dir) = &cli.package {
        handle_package(&config, dir).await?;
    } else if let Some(path) = &cli.format {
        handle_format(path)?;
    } else if cli.random {
        handle_random(&config, !cli.no_archive).await?;
    } else {
        let section = resolve_section(&config, cli.section.as_deref())?.clone();

        if cli.dry_run {
            handle_dry_run(&config, &section, cli.start_page, cli.end_page);
        } else {
            handle_crawl(&config, &section, cli.start_page, cli.end_page, !cli.no_archive).await?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("forum_harvest=info,warn"),
            1 => EnvFilter::new("forum_harvest=debug,info"),
            2 => EnvFilter::new("forum_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Picks the requested section, or the first configured one
fn resolve_section<'a>(config: &'a Config, key: Option<&str>) -> Result<&'a SectionEntry, HarvestError> {
    match key {
        Some(key) => config
            .section(key)
            .ok_or_else(|| HarvestError::UnknownSection(key.to_string())),
        None => config
            .sections
            .first()
            .ok_or_else(|| HarvestError::UnknownSection("<none configured>".to_string())),
    }
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config, section: &SectionEntry, start_page: u32, end_page: u32) {
    println!("=== Forum-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  User agent: {}", config.site.user_agent);

    println!("\nCrawler Configuration:");
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Max posts per page: {}", describe(config.crawler.max_posts_per_page));
    println!("  Max items per post: {}", describe(config.crawler.max_items_per_post));
    println!("  Download workers: {}", config.crawler.download_workers);
    println!("  Ledger policy: {:?}", config.crawler.ledger_policy);

    println!("\nSection:");
    println!("  {} - {} ({})", section.key, section.name, section.kind);
    println!("  Ledger: {}", config.ledger_path(section.kind));
    println!("  Content: {}", section_content_dir(config, section).display());
    for page in start_page..=end_page {
        println!("    * {}", section.listing_url(&config.site.base_url, page));
    }

    println!("\nArchive:");
    if config.archive.enabled {
        println!(
            "  Output: {}",
            archive_output_path(config, section, Local::now()).display()
        );
        println!("  Volume size: {} bytes", config.archive.volume_size);
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would visit {} listing page(s)",
        (start_page..=end_page).count()
    );
}

fn describe(limit: Option<usize>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |n| n.to_string())
}

/// Handles the --stats mode: shows ledger statistics
fn handle_stats(config: &Config) {
    let stats = load_ledger_statistics(config);
    print_ledger_statistics(&stats);
}

/// Handles the --package mode: archives an existing directory
async fn handle_package(config: &Config, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());

    let file_name = config
        .archive
        .file_name
        .clone()
        .unwrap_or_else(|| forum_harvest::archive::default_archive_name(&name, Local::now()));
    let output = Path::new(&config.output.archive_dir).join(file_name);

    let report = package(config, dir.to_path_buf(), output).await?;
    write_archive_index(&archive_index_path(config), &report)?;

    println!("✓ Packaged {} files into {} archive(s)", report.file_count, report.volumes.len());
    Ok(())
}

/// Handles the --format mode: writes reading-layout copies of saved text
fn handle_format(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let written = format_path(path)?;
    println!("✓ Formatted {} file(s)", written.len());
    Ok(())
}

/// Handles the --random mode: one random page of a random section
async fn handle_random(config: &Config, archive: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (target, fallback) = {
        let mut rng = rand::thread_rng();
        let target = pick_random_target(config, &mut rng)
            .ok_or_else(|| HarvestError::UnknownSection("<none configured>".to_string()))?;
        (target, pick_fallback_section(config, &mut rng))
    };

    let section = target.section;
    handle_crawl(config, section, target.page, target.page, archive).await?;

    if section.kind != ContentKind::Media || has_entries(&section_content_dir(config, section)) {
        return Ok(());
    }

    match fallback {
        Some(text) => {
            tracing::warn!(
                "Nothing saved from '{}', trying text section '{}'",
                section.key,
                text.key
            );
            handle_crawl(config, text, target.page, target.page, archive).await
        }
        None => {
            tracing::warn!("Nothing saved from '{}' and no text section to fall back to", section.key);
            Ok(())
        }
    }
}

/// Handles the main harvest operation
async fn handle_crawl(
    config: &Config,
    section: &SectionEntry,
    start_page: u32,
    end_page: u32,
    archive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Section '{}' ({}), pages {}-{}",
        section.name,
        section.kind,
        start_page,
        end_page
    );

    let coordinator = Coordinator::from_config(config, section)?;
    let report = coordinator.run(section, start_page..=end_page).await;
    print_report(section, &report);

    if !archive || !config.archive.enabled {
        tracing::info!("Packaging disabled, done");
        return Ok(());
    }

    let source = section_content_dir(config, section);
    if !has_entries(&source) {
        tracing::warn!("Nothing saved under {}, skipping packaging", source.display());
        return Ok(());
    }

    let output = archive_output_path(config, section, Local::now());
    match package(config, source, output).await {
        Ok(report) => {
            if let Err(e) = write_archive_index(&archive_index_path(config), &report) {
                tracing::error!("Failed to record archives: {}", e);
            }
        }
        Err(e) => tracing::warn!("No archive produced: {}", e),
    }

    Ok(())
}

/// Runs the archiver on the blocking thread pool
async fn package(
    config: &Config,
    source: PathBuf,
    output: PathBuf,
) -> Result<ArchiveReport, Box<dyn std::error::Error>> {
    let archiver = Archiver::from_config(&config.archive);
    let report =
        tokio::task::spawn_blocking(move || archiver.zip_directory(&source, &output)).await??;
    Ok(report)
}

fn archive_index_path(config: &Config) -> PathBuf {
    Path::new(&config.output.archive_dir).join(ARCHIVE_INDEX_FILE)
}

fn has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
