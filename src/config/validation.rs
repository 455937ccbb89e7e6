use crate::config::types::{ArchiveConfig, Config, CrawlerConfig, OutputConfig, SectionEntry, SiteConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_archive_config(&config.archive)?;
    validate_sections(&config.sections)?;
    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.download_workers < 1 || config.download_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "download-workers must be between 1 and 64, got {}",
            config.download_workers
        )));
    }

    if config.max_posts_per_page == Some(0) {
        return Err(ConfigError::Validation(
            "max-posts-per-page must be >= 1 when set".to_string(),
        ));
    }

    if config.max_items_per_post == Some(0) {
        return Err(ConfigError::Validation(
            "max-items-per-post must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("media-dir", &config.media_dir),
        ("text-dir", &config.text_dir),
        ("archive-dir", &config.archive_dir),
        ("media-ledger", &config.media_ledger),
        ("text-ledger", &config.text_ledger),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates archive configuration
fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    if config.volume_size < 1 {
        return Err(ConfigError::Validation(
            "volume-size must be >= 1 byte".to_string(),
        ));
    }

    if let Some(name) = &config.file_name {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "archive file-name must be a bare file name, got '{}'",
                name
            )));
        }
    }

    Ok(())
}

/// Validates forum section entries
fn validate_sections(sections: &[SectionEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for section in sections {
        if section.key.is_empty() {
            return Err(ConfigError::Validation(
                "section key cannot be empty".to_string(),
            ));
        }

        if !seen.insert(section.key.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate section key '{}'",
                section.key
            )));
        }

        if section.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "section '{}' must have a name",
                section.key
            )));
        }

        if !section.url_template.contains("{page}") {
            return Err(ConfigError::Validation(format!(
                "url-template of section '{}' must contain {{page}}",
                section.key
            )));
        }
    }

    Ok(())
}
