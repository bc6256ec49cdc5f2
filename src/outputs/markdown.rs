//! Markdown rendering of a [`Listing`].
//!
//! # Structure
//!
//! ```text
//! # Articles (page 2 of 5, 43 articles)
//!
//! ## [Title](link)
//! *Source* · 06 May 2025 – 14:30 · ranking 7 (alice)
//! `IoT` `Energy` | `Grid`
//!
//! Summary text…
//! ```

use super::Listing;
use crate::models::Article;
use crate::utils::truncate_for_display;
use std::fmt;

/// Summaries longer than this are shortened in listings.
const SUMMARY_PREVIEW_BYTES: usize = 400;

/// Display adapter rendering a listing as Markdown.
pub struct Markdown<'l, 'a>(pub &'l Listing<'a>);

impl fmt::Display for Markdown<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listing = self.0;
        let page = &listing.page;

        for error in &listing.errors {
            writeln!(f, "> **Error:** {error}")?;
        }
        if !listing.errors.is_empty() {
            writeln!(f, "> Run `feedsnap refresh` to rebuild the article cache.\n")?;
        }

        writeln!(
            f,
            "# Articles (page {} of {}, {} articles)\n",
            page.page, page.total_pages, page.total_items
        )?;

        if let Some(query) = listing.query.filter(|q| !q.trim().is_empty()) {
            writeln!(f, "Search: `{query}`")?;
        }
        if !listing.selected_domains.is_empty() {
            writeln!(f, "Domains: {}", listing.selected_domains.join(", "))?;
        }
        if !listing.selected_themes.is_empty() {
            writeln!(f, "Themes: {}", listing.selected_themes.join(", "))?;
        }

        if page.items.is_empty() {
            writeln!(f, "_No articles._")?;
        }
        for article in page.items {
            write_article(f, article)?;
        }

        if page.total_pages > 1 {
            writeln!(f, "---\nPage {} / {}", page.page, page.total_pages)?;
        }
        Ok(())
    }
}

fn write_article(f: &mut fmt::Formatter<'_>, article: &Article) -> fmt::Result {
    if article.link.is_empty() {
        writeln!(f, "## {}", article.title)?;
    } else {
        writeln!(f, "## [{}]({})", article.title, article.link)?;
    }

    write!(f, "*{}*", article.source)?;
    if !article.published.is_empty() {
        write!(f, " · {}", article.published)?;
    }
    write!(f, " · ranking {}", article.article_ranking)?;
    if !article.ranking_author.is_empty() {
        write!(f, " ({})", article.ranking_author)?;
    }
    writeln!(f)?;

    writeln!(f, "{} | {}", tags(&article.domains), tags(&article.themes))?;

    if let Some(image) = &article.image_url {
        writeln!(f, "\n![]({image})")?;
    }
    if !article.summary.is_empty() {
        writeln!(f, "\n{}", truncate_for_display(&article.summary, SUMMARY_PREVIEW_BYTES))?;
    }
    writeln!(f)
}

fn tags(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("`{v}`"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render `listing` as a Markdown string.
pub fn render(listing: &Listing<'_>) -> String {
    Markdown(listing).to_string()
}
