//! Turns registry feeds into normalized articles.
//!
//! Every feed is fetched and parsed independently; a failing feed is
//! recorded in the [`RefreshReport`] and contributes no articles, while its
//! siblings carry on. Per entry, the image and full-text extractors run best
//! effort and fall back to "no image" / empty text.
//!
//! # Concurrency
//!
//! - at most `feed_concurrency` feeds in flight; output keeps registry order
//! - article page fetches share one semaphore of `page_concurrency` permits
//!   across all feeds
//! - every request carries the fetcher's timeout

use crate::error::FeedFetchError;
use crate::extractors::image::extract_image;
use crate::extractors::text::{DISPLAY_DATE_FORMAT, clean_html, extract_full_text, format_date};
use crate::feeds::parser::parse_feed;
use crate::fetch::FetchAsync;
use crate::models::{Article, Feed, FeedEntry};
use crate::utils::truncate_for_log;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

/// A feed that contributed no articles to a refresh, and why.
#[derive(Debug)]
pub struct FeedFailure {
    pub feed: String,
    pub url: String,
    pub error: FeedFetchError,
}

/// Outcome of [`Assembler::load_all_articles`].
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Articles in registry order, then entry order within each feed.
    pub articles: Vec<Article>,
    pub failures: Vec<FeedFailure>,
    pub feeds_ok: usize,
}

/// Fetches feeds and assembles their entries into [`Article`]s.
pub struct Assembler<F, P> {
    feed_fetcher: F,
    page_fetcher: P,
    feed_concurrency: usize,
    page_concurrency: usize,
    page_permits: Semaphore,
}

impl<F, P> Assembler<F, P>
where
    F: FetchAsync,
    P: FetchAsync,
{
    pub fn new(feed_fetcher: F, page_fetcher: P, feed_concurrency: usize, page_concurrency: usize) -> Self {
        let page_concurrency = page_concurrency.max(1);
        Self {
            feed_fetcher,
            page_fetcher,
            feed_concurrency: feed_concurrency.max(1),
            page_concurrency,
            page_permits: Semaphore::new(page_concurrency),
        }
    }

    /// Fetch every feed and assemble one article per entry.
    ///
    /// Never fails as a whole: feed-level errors end up in
    /// [`RefreshReport::failures`]. Returns once every feed has either
    /// produced its articles or been recorded as failed.
    #[instrument(level = "info", skip_all, fields(feeds = feeds.len()))]
    pub async fn load_all_articles(&self, feeds: &[Feed]) -> RefreshReport {
        let outcomes: Vec<(&Feed, Result<Vec<Article>, FeedFetchError>)> = stream::iter(feeds)
            .map(|feed| async move { (feed, self.load_feed(feed).await) })
            .buffered(self.feed_concurrency)
            .collect()
            .await;

        let mut report = RefreshReport::default();
        for (feed, outcome) in outcomes {
            match outcome {
                Ok(articles) => {
                    info!(feed = %feed.name, count = articles.len(), "Fetched feed");
                    report.feeds_ok += 1;
                    report.articles.extend(articles);
                }
                Err(error) => {
                    warn!(feed = %feed.name, url = %feed.url, error = %error, "Feed skipped");
                    report.failures.push(FeedFailure {
                        feed: feed.name.clone(),
                        url: feed.url.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            articles = report.articles.len(),
            feeds_ok = report.feeds_ok,
            feeds_failed = report.failures.len(),
            "Assembled articles"
        );
        report
    }

    #[instrument(level = "debug", skip_all, fields(feed = %feed.name))]
    async fn load_feed(&self, feed: &Feed) -> Result<Vec<Article>, FeedFetchError> {
        let body = self.feed_fetcher.fetch(&feed.url).await?;
        let entries = parse_feed(&body).inspect_err(|e| {
            debug!(error = %e, preview = %truncate_for_log(&body, 200), "Unparseable feed document");
        })?;
        debug!(entries = entries.len(), "Parsed feed");

        let articles = stream::iter(entries)
            .map(|entry| self.assemble(feed, entry))
            .buffered(self.page_concurrency)
            .collect()
            .await;
        Ok(articles)
    }

    async fn assemble(&self, feed: &Feed, entry: FeedEntry) -> Article {
        let full_text = {
            let _permit = self.page_permits.acquire().await.ok();
            extract_full_text(&self.page_fetcher, entry.link()).await
        };
        let full_text = full_text.unwrap_or_else(|e| {
            debug!(link = %entry.link(), error = %e, "Full text unavailable");
            String::new()
        });

        build_article(feed, &entry, full_text)
    }
}

/// Merge registry metadata, entry fields and extractor output into an article.
pub fn build_article(feed: &Feed, entry: &FeedEntry, full_text: String) -> Article {
    Article {
        source: feed.name.clone(),
        domains: feed.domains.clone(),
        themes: feed.themes.clone(),
        title: entry.title().to_string(),
        link: entry.link().to_string(),
        published: format_date(entry.published()),
        summary: clean_html(entry.summary_html()),
        full_text,
        image_url: extract_image(entry),
        source_ranking: feed.source_ranking,
        article_ranking: feed.source_ranking,
        ranking_author: feed.ranking_author.clone(),
        feasibility_score: 0,
        feasibility_author: String::new(),
        fetched_at: Utc::now().format(DISPLAY_DATE_FORMAT).to_string(),
    }
}
