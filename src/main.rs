//! # feedsnap
//!
//! Aggregates articles from a registry of RSS/Atom feeds, normalizes each
//! entry into a taxonomy-tagged article, keeps the result as a CSV snapshot
//! and serves filtered, searchable, paginated views of it.
//!
//! ## Usage
//!
//! ```sh
//! feedsnap refresh
//! feedsnap list --domain IoT --query gateway --page 2
//! feedsnap domains
//! ```
//!
//! ## Architecture
//!
//! 1. **Registry**: read the configured feeds (`registry`)
//! 2. **Ingestion**: fetch every feed concurrently and assemble articles,
//!    extracting images and full text per entry (`feeds`, `extractors`)
//! 3. **Snapshot**: replace the article CSV as a whole (`snapshot`)
//! 4. **Query**: filter, search and paginate the snapshot (`query`, `outputs`)

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extractors;
mod feeds;
mod fetch;
mod models;
mod outputs;
mod query;
mod registry;
mod snapshot;
mod utils;

use cli::{Cli, Command, Format, ListArgs, SourceArgs, SourcesCommand};
use config::Settings;
use models::{Article, Feed};
use outputs::{Listing, json, markdown};
use utils::split_taxonomy;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(registry) = args.registry {
        settings.registry_path = registry;
    }
    if let Some(snapshot) = args.snapshot {
        settings.snapshot_path = snapshot;
    }

    match args.command {
        Command::Refresh => run_refresh(&settings).await,
        Command::List(list) => run_list(&settings, &list),
        Command::Domains => {
            for domain in registry::available_domains(&settings.registry_path)? {
                println!("{domain}");
            }
            Ok(())
        }
        Command::Themes => {
            for theme in registry::available_themes(&settings.registry_path)? {
                println!("{theme}");
            }
            Ok(())
        }
        Command::Sources(command) => run_sources(&settings, command),
    }
}

#[instrument(level = "info", skip_all)]
async fn run_refresh(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();
    info!("Refresh starting");

    let report = match feeds::refresh(settings).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Refresh aborted; previous snapshot left in place");
            return Err(e.into());
        }
    };

    for failure in &report.failures {
        warn!(
            feed = %failure.feed,
            url = %failure.url,
            error = %failure.error,
            "Feed contributed no articles"
        );
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = report.articles.len(),
        feeds_ok = report.feeds_ok,
        feeds_failed = report.failures.len(),
        "Execution complete"
    );
    println!(
        "{} articles from {} feeds ({} failed) written to {}",
        report.articles.len(),
        report.feeds_ok,
        report.failures.len(),
        settings.snapshot_path.display()
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(page = list.page))]
fn run_list(settings: &Settings, list: &ListArgs) -> Result<(), Box<dyn Error>> {
    let (articles, errors) = snapshot::read(&settings.snapshot_path);

    let filtered = query::filter(&articles, &list.domains, &list.themes);
    let query_text = list.query.as_deref().unwrap_or("");
    let found: Vec<&Article> = query::search(filtered, query_text);

    let per_page = list.per_page.unwrap_or(settings.per_page);
    let listing = Listing {
        page: query::paginate(&found, list.page, per_page),
        query: list.query.as_deref(),
        selected_domains: &list.domains,
        selected_themes: &list.themes,
        errors: errors.iter().map(ToString::to_string).collect(),
    };
    debug!(
        total = listing.page.total_items,
        total_pages = listing.page.total_pages,
        "Built listing"
    );

    match list.format {
        Format::Markdown => print!("{}", markdown::render(&listing)),
        Format::Json => println!("{}", json::render(&listing)?),
    }
    Ok(())
}

fn feed_from_args(source: SourceArgs) -> Feed {
    Feed {
        name: source.name,
        url: source.url,
        domains: split_taxonomy(&source.domains),
        themes: split_taxonomy(&source.themes),
        source_ranking: source.ranking,
        ranking_author: source.author,
    }
}

#[instrument(level = "info", skip_all)]
fn run_sources(settings: &Settings, command: SourcesCommand) -> Result<(), Box<dyn Error>> {
    let path = &settings.registry_path;
    match command {
        SourcesCommand::List => {
            for (index, feed) in registry::load_feeds(path)?.iter().enumerate() {
                println!(
                    "{index}\t{}\t{}\t[{}]\t[{}]\t{} ({})",
                    feed.name,
                    feed.url,
                    feed.domains.join(", "),
                    feed.themes.join(", "),
                    feed.source_ranking,
                    feed.ranking_author
                );
            }
        }
        SourcesCommand::Add(source) => {
            registry::append_feed(path, feed_from_args(source))?;
        }
        SourcesCommand::Update { index, source } => {
            registry::replace_feed(path, index, feed_from_args(source))?;
        }
        SourcesCommand::Remove { index } => {
            let removed = registry::remove_feed(path, index)?;
            println!("Removed {}", removed.name);
        }
    }
    Ok(())
}
