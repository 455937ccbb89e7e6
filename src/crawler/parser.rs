//! HTML parser for listing pages and posts
//!
//! This module handles parsing forum HTML to extract:
//! - Post links from a section listing page
//! - Gallery titles and media URLs from image posts
//! - Title, author and body from text posts
//!
//! Everything here is tied to the markup of one forum family; the rest of the
//! crate only sees the results through the `Fetcher` and `Extractor` traits.

use crate::content::{MediaSet, TextDocument, UNKNOWN_AUTHOR, UNTITLED};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Extracts post links from a listing page
///
/// Every `<a href>` whose target ends in `.html` is a post. Links are
/// returned as written in the page, in first-seen order, without duplicates.
///
/// # Example
///
/// ```
/// use forum_harvest::crawler::extract_post_links;
///
/// let html = r#"<a href="htm_data/1.html">a</a><a href="index.php">b</a>"#;
/// assert_eq!(extract_post_links(html), vec!["htm_data/1.html"]);
/// ```
pub fn extract_post_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| href.ends_with(".html"))
        .filter(|href| seen.insert(href.to_string()))
        .map(str::to_string)
        .collect()
}

/// Parses an image post into its title and media URLs
///
/// Media URLs come from `ess-data` attributes in document order; when a post
/// has none, lazily loaded `img[data-src]` sources are used instead.
pub fn parse_gallery(html: &str) -> MediaSet {
    let document = Html::parse_document(html);
    let title = page_title(&document).unwrap_or_else(|| UNTITLED.to_string());

    let mut urls = attribute_values(&document, "[ess-data]", "ess-data");
    if urls.is_empty() {
        urls = attribute_values(&document, "img[data-src]", "data-src");
    }

    MediaSet { title, urls }
}

/// Parses a text post into title, author and body
pub fn parse_article(html: &str) -> TextDocument {
    let document = Html::parse_document(html);

    let title = page_title(&document)
        .map(|t| strip_bracket_tags(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let author = meta_author(&document).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let body = body_paragraphs(&document)
        .filter(|b| !b.trim().is_empty())
        .or_else(|| post_message_text(&document))
        .map(|b| collapse_blank_lines(&b))
        .unwrap_or_default();

    TextDocument {
        title,
        author,
        body,
    }
}

/// Extracts the page title up to the first `|`
fn page_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .map(|text| text.split('|').next().unwrap_or_default().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn attribute_values(document: &Html, selector: &str, attr: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn meta_author(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="author"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

/// Paragraphs of the first `div` whose id mentions `body`
fn body_paragraphs(document: &Html) -> Option<String> {
    let div_selector = Selector::parse("div[id]").ok()?;
    let p_selector = Selector::parse("p").ok()?;

    let container = document
        .select(&div_selector)
        .find(|div| div.value().id().is_some_and(|id| id.contains("body")))?;

    let mut body = String::new();
    for paragraph in container.select(&p_selector) {
        body.push_str(&element_text(paragraph));
        body.push_str("\n\n");
    }

    Some(body)
}

/// Text of the first element whose id starts with `postmessage_`
fn post_message_text(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"[id^="postmessage_"]"#).ok()?;

    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|text| !text.trim().is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Removes `【...】` tags from a title
fn strip_bracket_tags(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut depth = 0usize;

    for c in title.chars() {
        match c {
            '【' => depth += 1,
            '】' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Collapses runs of three or more newlines to two and trims the result
fn collapse_blank_lines(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let mut out = String::with_capacity(normalized.len());
    let mut newlines = 0;

    for c in normalized.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }

    out.trim().to_string()
}
