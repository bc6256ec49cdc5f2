//! Plain-text normalization of feed markup and article pages.
//!
//! - [`clean_html`]: drop non-text elements and collapse whitespace
//! - [`extract_full_text`]: fetch an article page and keep its paragraph text
//! - [`format_date`]: render RFC 2822 feed dates for display

use crate::error::ExtractionFailure;
use crate::fetch::FetchAsync;
use chrono::DateTime;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};

/// Display format shared by `published` and `fetched_at`.
pub const DISPLAY_DATE_FORMAT: &str = "%d %B %Y – %H:%M";

/// Elements removed together with everything inside them.
const STRIPPED_ELEMENTS: [&str; 4] = ["script", "style", "table", "img"];

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Reduce an HTML fragment to whitespace-normalized plain text.
///
/// `script`, `style`, `table` and `img` elements are removed entirely. The
/// remaining text nodes are joined with single spaces. Empty input gives an
/// empty string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_html("<p>Hello <b>world</b></p><script>x()</script>"), "Hello world");
/// ```
pub fn clean_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let mut pieces = Vec::new();
    collect_text(fragment.root_element(), &mut pieces);
    join_words(&pieces)
}

fn join_words(pieces: &[&str]) -> String {
    pieces
        .iter()
        .flat_map(|piece| piece.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_text<'a>(element: ElementRef<'a>, out: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if !STRIPPED_ELEMENTS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push(&**text);
        }
    }
}

/// Concatenated text of every `<p>` element of a page, cleaned the same way
/// as [`clean_html`].
pub fn paragraph_text(page_html: &str) -> String {
    let document = Html::parse_document(page_html);
    let mut pieces = Vec::new();
    for paragraph in document.select(&PARAGRAPH) {
        collect_text(paragraph, &mut pieces);
    }
    join_words(&pieces)
}

/// Fetch the article at `link` and extract its body text.
///
/// Best effort: callers are expected to fall back to an empty string on any
/// error. The fetcher carries the request timeout.
#[instrument(level = "debug", skip_all, fields(%link))]
pub async fn extract_full_text<F>(fetcher: &F, link: &str) -> Result<String, ExtractionFailure>
where
    F: FetchAsync,
{
    if link.trim().is_empty() {
        return Err(ExtractionFailure::MissingLink);
    }
    let page = fetcher.fetch(link).await?;
    let text = paragraph_text(&page);
    if text.is_empty() {
        return Err(ExtractionFailure::NoContent);
    }
    debug!(bytes = text.len(), "Extracted full text");
    Ok(text)
}

/// Reformat an RFC 2822 date for display; unparseable input is returned as is.
///
/// ```ignore
/// assert_eq!(format_date("Tue, 06 May 2025 14:30:00 +0000"), "06 May 2025 – 14:30");
/// assert_eq!(format_date("yesterday"), "yesterday");
/// ```
pub fn format_date(raw: &str) -> String {
    match DateTime::parse_from_rfc2822(raw.trim()) {
        Ok(dt) => dt.format(DISPLAY_DATE_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}
