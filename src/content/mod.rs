//! Extracted post content and the file-tree saver
//!
//! A post yields either a gallery of remote media URLs or a text document.
//! The coordinator never looks inside beyond [`ExtractedContent::is_empty`];
//! everything else is between the extractor that builds it and the saver that
//! writes it out.

mod format;
mod saver;

pub use format::{format_file, format_novel, format_path, FORMATTED_SUFFIX};
pub use saver::{guess_extension, FileSaver};

use crate::config::ContentKind;

/// Title used when a post has none, or when sanitizing leaves nothing
pub const UNTITLED: &str = "untitled";

/// Author used when a text post does not name one
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Content extracted from a single post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedContent {
    /// Image gallery
    Media(MediaSet),
    /// Literary text
    Text(TextDocument),
}

/// Ordered list of remote media URLs belonging to one post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSet {
    pub title: String,
    pub urls: Vec<String>,
}

/// A text post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub title: String,
    pub author: String,
    pub body: String,
}

impl ExtractedContent {
    /// The empty form for a content kind, returned when extraction fails
    pub fn empty(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Media => Self::Media(MediaSet {
                title: UNTITLED.to_string(),
                urls: Vec::new(),
            }),
            ContentKind::Text => Self::Text(TextDocument {
                title: UNTITLED.to_string(),
                author: UNKNOWN_AUTHOR.to_string(),
                body: String::new(),
            }),
        }
    }

    /// Returns true if there is nothing worth saving
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Media(set) => set.urls.is_empty(),
            Self::Text(doc) => doc.body.trim().is_empty(),
        }
    }

    /// The post title
    pub fn title(&self) -> &str {
        match self {
            Self::Media(set) => &set.title,
            Self::Text(doc) => &doc.title,
        }
    }

    /// Which kind of content this is
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Media(_) => ContentKind::Media,
            Self::Text(_) => ContentKind::Text,
        }
    }
}

impl MediaSet {
    /// Keeps at most `max` URLs, front of the list first
    pub fn cap(&mut self, max: Option<usize>) {
        if let Some(max) = max {
            if self.urls.len() > max {
                tracing::info!(
                    "Post '{}' has {} items, keeping {}",
                    self.title,
                    self.urls.len(),
                    max
                );
                self.urls.truncate(max);
            }
        }
    }
}

/// Makes a post title or section name safe to use as a path component
///
/// Removes characters that are illegal in file names on common platforms and
/// control characters. Returns [`UNTITLED`] when nothing is left.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .filter(|c| !c.is_control())
        .collect();

    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_forms() {
        assert!(ExtractedContent::empty(ContentKind::Media).is_empty());
        assert!(ExtractedContent::empty(ContentKind::Text).is_empty());
        assert_eq!(
            ExtractedContent::empty(ContentKind::Text).kind(),
            ContentKind::Text
        );
    }

    #[test]
    fn test_whitespace_body_is_empty() {
        let content = ExtractedContent::Text(TextDocument {
            title: "t".to_string(),
            author: UNKNOWN_AUTHOR.to_string(),
            body: " \n\n ".to_string(),
        });
        assert!(content.is_empty());
    }

    #[test]
    fn test_media_cap_keeps_front() {
        let mut set = MediaSet {
            title: "gallery".to_string(),
            urls: vec!["a".into(), "b".into(), "c".into()],
        };
        set.cap(Some(2));
        assert_eq!(set.urls, vec!["a".to_string(), "b".to_string()]);

        set.cap(None);
        assert_eq!(set.urls.len(), 2);
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("a/b:c*d?\"e<f>g|h"), "abcdefgh");
        assert_eq!(sanitize_component("  spaced  "), "spaced");
        assert_eq!(sanitize_component("..."), UNTITLED);
        assert_eq!(sanitize_component(""), UNTITLED);
        assert_eq!(sanitize_component("tab\there"), "tabhere");
    }
}
