//! Data models for feeds, parsed feed entries and normalized articles.
//!
//! - [`Feed`]: one row of the feed registry
//! - [`FeedEntry`]: one item of a fetched feed document, before normalization
//! - [`Article`]: the normalized, taxonomy-tagged record kept in the snapshot

use serde::{Deserialize, Serialize};

/// Title used for entries that carry none.
pub const UNTITLED: &str = "untitled";

/// A configured syndication source with its taxonomy and ranking metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Display name, unique within the registry.
    pub name: String,
    /// Fetch target of the feed document.
    pub url: String,
    pub domains: Vec<String>,
    pub themes: Vec<String>,
    /// Source-quality score.
    pub source_ranking: i64,
    pub ranking_author: String,
}

/// A `url`-bearing media element (`media:content`, `media:thumbnail`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRef {
    pub url: Option<String>,
}

/// An item-level `<image>` object. Any of its keys may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRef {
    pub url: Option<String>,
    pub href: Option<String>,
    pub link: Option<String>,
}

/// A rich content block (`content:encoded`, Atom `<content>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBlock {
    pub value: String,
}

/// One entry of a parsed feed document.
///
/// Every field is optional in the wild; the accessors below apply the
/// named defaults so callers never deal with absence directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub summary: Option<String>,
    pub content: Vec<ContentBlock>,
    pub media_content: Vec<MediaRef>,
    pub media_thumbnail: Vec<MediaRef>,
    pub image: Option<ImageRef>,
}

impl FeedEntry {
    /// Entry title, or [`UNTITLED`].
    pub fn title(&self) -> &str {
        non_empty(self.title.as_deref()).unwrap_or(UNTITLED)
    }

    /// Entry link, or the empty string.
    pub fn link(&self) -> &str {
        non_empty(self.link.as_deref()).unwrap_or("")
    }

    /// Raw published date as found in the document, or the empty string.
    pub fn published(&self) -> &str {
        self.published.as_deref().unwrap_or("")
    }

    /// The basic summary field, or the empty string.
    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    /// Value of the first content block, when it has one.
    pub fn first_content(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|block| non_empty(Some(block.value.as_str())))
    }

    /// Summary HTML, preferring the richer content block over the summary.
    pub fn summary_html(&self) -> &str {
        self.first_content().unwrap_or_else(|| self.summary())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// A normalized article produced from one feed entry.
///
/// `domains` and `themes` are copies of the source feed's taxonomy taken at
/// fetch time and are not updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Name of the originating feed.
    pub source: String,
    pub domains: Vec<String>,
    pub themes: Vec<String>,
    pub title: String,
    pub link: String,
    /// Display date; not guaranteed to be parseable.
    pub published: String,
    pub summary: String,
    /// Extracted article body, empty when extraction failed.
    pub full_text: String,
    pub image_url: Option<String>,
    pub source_ranking: i64,
    /// Reserved for per-article adjustment; starts equal to `source_ranking`.
    pub article_ranking: i64,
    pub ranking_author: String,
    /// Reserved; not computed by the pipeline.
    pub feasibility_score: i64,
    pub feasibility_author: String,
    pub fetched_at: String,
}
