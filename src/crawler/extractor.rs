//! Post extractors for image and text sections

use crate::config::SectionEntry;
use crate::content::ExtractedContent;
use crate::crawler::parser::{parse_article, parse_gallery};
use crate::crawler::{Extractor, HttpClient};
use crate::Result;
use async_trait::async_trait;
use url::Url;

/// Extracts image galleries, keeping at most `max_items` URLs per post
#[derive(Debug, Clone)]
pub struct GalleryExtractor {
    http: HttpClient,
    base_url: Url,
    max_items: Option<usize>,
}

impl GalleryExtractor {
    pub fn new(http: HttpClient, base_url: Url, max_items: Option<usize>) -> Self {
        Self {
            http,
            base_url,
            max_items,
        }
    }
}

#[async_trait]
impl Extractor for GalleryExtractor {
    async fn extract(&self, _section: &SectionEntry, id: &str) -> Result<ExtractedContent> {
        let url = self.base_url.join(id)?;
        let body = self.http.fetch_text(url.as_str()).await?;

        let mut gallery = parse_gallery(&body);
        tracing::info!("Post '{}' has {} items", gallery.title, gallery.urls.len());
        gallery.cap(self.max_items);

        Ok(ExtractedContent::Media(gallery))
    }
}

/// Extracts literary text posts
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    http: HttpClient,
    base_url: Url,
}

impl ArticleExtractor {
    pub fn new(http: HttpClient, base_url: Url) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl Extractor for ArticleExtractor {
    async fn extract(&self, _section: &SectionEntry, id: &str) -> Result<ExtractedContent> {
        let url = self.base_url.join(id)?;
        let body = self.http.fetch_text(url.as_str()).await?;
        Ok(ExtractedContent::Text(parse_article(&body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentKind;
    use reqwest::Client;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn section(kind: ContentKind) -> SectionEntry {
        SectionEntry {
            key: "s".to_string(),
            name: "Section".to_string(),
            kind,
            url_template: "{base}/list?page={page}".to_string(),
        }
    }

    fn http() -> HttpClient {
        HttpClient::new(Client::new(), Duration::ZERO, 0)
    }

    #[tokio::test]
    async fn test_gallery_extractor_applies_item_cap() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/htm_data/7/1.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head><title>Set | Forum</title></head><body>
                <img ess-data='https://img.example.com/1.jpg'>
                <img ess-data='https://img.example.com/2.jpg'>
                <img ess-data='https://img.example.com/3.jpg'>
                </body></html>"#,
            ))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let extractor = GalleryExtractor::new(http(), base, Some(2));
        let content = extractor
            .extract(&section(ContentKind::Media), "htm_data/7/1.html")
            .await
            .unwrap();

        match content {
            ExtractedContent::Media(set) => {
                assert_eq!(set.title, "Set");
                assert_eq!(set.urls.len(), 2);
                assert_eq!(set.urls[0], "https://img.example.com/1.jpg");
            }
            other => panic!("expected media, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_article_extractor_propagates_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let extractor = ArticleExtractor::new(http(), base);
        let result = extractor
            .extract(&section(ContentKind::Text), "htm_data/20/9.html")
            .await;

        assert!(result.is_err());
    }
}
