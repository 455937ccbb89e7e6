//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - The fixed politeness delay before every request
//! - Bounded retries with the same delay between attempts
//! - Listing post identifiers of a forum section page
//! - Streaming media downloads to disk

use crate::config::{Config, SectionEntry, SiteConfig};
use crate::crawler::parser::extract_post_links;
use crate::crawler::{Fetcher, PostId};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `site` - The site configuration (user agent)
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(site: &SiteConfig, timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(site.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Polite HTTP client: fixed delay before each request, bounded retries
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    delay: Duration,
    max_retries: u32,
}

impl HttpClient {
    /// Wraps a reqwest client with the given delay and retry bound
    pub fn new(client: Client, delay: Duration, max_retries: u32) -> Self {
        Self {
            client,
            delay,
            max_retries,
        }
    }

    /// Builds the client described by the site and crawler configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(
            &config.site,
            Duration::from_secs(config.crawler.timeout_secs),
        )?;

        Ok(Self::new(
            client,
            Duration::from_millis(config.crawler.request_delay_ms),
            config.crawler.max_retries,
        ))
    }

    /// Sends a GET request with delay and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Before first attempt | Sleep the fixed delay |
    /// | Network error / timeout | Retry after the delay |
    /// | Non-2xx status | Retry after the delay |
    /// | Attempts exhausted | Return the last error |
    async fn get(&self, url: &str) -> Result<Response> {
        tokio::time::sleep(self.delay).await;

        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            tracing::debug!("GET {} (attempt {}/{})", url, attempt, attempts);

            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    tracing::warn!("HTTP {} for {} (attempt {}/{})", status, url, attempt, attempts);
                    last_error = Some(HarvestError::Status {
                        url: url.to_string(),
                        status,
                    });
                }
                Err(e) => {
                    tracing::warn!("Request to {} failed (attempt {}/{}): {}", url, attempt, attempts, e);
                    last_error = Some(HarvestError::Http {
                        url: url.to_string(),
                        source: e,
                    });
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.delay).await;
            }
        }

        tracing::error!("Giving up on {} after {} attempts", url, attempts);
        Err(last_error.unwrap_or(HarvestError::RetriesExhausted {
            url: url.to_string(),
            attempts,
        }))
    }

    /// Fetches a URL and returns its body as text
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })
    }

    /// Downloads a URL into `path`, returning the number of bytes written
    ///
    /// A partially written file is removed when the transfer fails.
    pub async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let response = self.get(url).await?;

        match write_body(response, path).await {
            Ok(bytes) => {
                tracing::debug!("Downloaded {} ({} bytes) to {}", url, bytes, path.display());
                Ok(bytes)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(path).await;
                Err(e)
            }
        }
    }
}

async fn write_body(mut response: Response, path: &Path) -> Result<u64> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let url = response.url().to_string();
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| HarvestError::Http {
            url: url.clone(),
            source,
        })?
    {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

/// Lists post identifiers from forum section listing pages
#[derive(Debug, Clone)]
pub struct ForumClient {
    http: HttpClient,
    base_url: Url,
}

impl ForumClient {
    /// Creates a listing client for the forum at `base_url`
    pub fn new(http: HttpClient, base_url: Url) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl Fetcher for ForumClient {
    async fn list_post_ids(&self, section: &SectionEntry, page: u32) -> Result<Vec<PostId>> {
        let url = section.listing_url(self.base_url.as_str(), page);
        let body = self.http.fetch_text(&url).await?;
        let ids = extract_post_links(&body);
        tracing::info!("Page {} of '{}' lists {} posts", page, section.name, ids.len());
        Ok(ids)
    }
}
