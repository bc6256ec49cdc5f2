//! Feed ingestion: parse feed documents and assemble articles.
//!
//! - [`parser`]: RSS / Atom documents into structured entries
//! - [`assembler`]: per-feed fetch, per-entry normalization, failure records
//!
//! [`refresh`] runs one full cycle: read the registry, assemble every feed,
//! replace the snapshot.

pub mod assembler;
pub mod parser;

use crate::config::Settings;
use crate::error::RefreshError;
use crate::fetch::Fetchers;
use crate::registry::load_feeds;
use crate::snapshot;
use assembler::{Assembler, RefreshReport};
use std::time::Instant;
use tracing::{info, instrument};

/// Re-read the registry, fetch every feed and replace the snapshot.
///
/// A registry error aborts before any network access. Individual feed
/// failures are part of the returned report and do not abort the refresh.
#[instrument(level = "info", skip_all, fields(registry = %settings.registry_path.display()))]
pub async fn refresh(settings: &Settings) -> Result<RefreshReport, RefreshError> {
    let t0 = Instant::now();
    let feeds = load_feeds(&settings.registry_path)?;

    let fetchers = Fetchers::from_settings(&settings.fetch)?;
    let assembler = Assembler::new(
        fetchers.feeds,
        fetchers.pages,
        settings.fetch.feed_concurrency,
        settings.fetch.page_concurrency,
    );
    let report = assembler.load_all_articles(&feeds).await;

    snapshot::write(&settings.snapshot_path, &report.articles)?;
    info!(
        articles = report.articles.len(),
        feeds_failed = report.failures.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        snapshot = %settings.snapshot_path.display(),
        "Refresh complete"
    );
    Ok(report)
}
