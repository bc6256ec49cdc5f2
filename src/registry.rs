//! Feed registry: the CSV list of configured feeds.
//!
//! The registry has the columns `name,url,domains,themes,source_ranking,ranking_author`.
//! `domains` and `themes` hold comma-separated taxonomy values.
//!
//! Loading is all-or-nothing: a missing column, a non-numeric ranking or a
//! repeated feed name aborts the load, so a refresh never runs against a
//! partial registry.
//! The registry is re-read on every call; nothing is cached.
//!
//! The row-editing helpers ([`append_feed`], [`replace_feed`],
//! [`remove_feed`]) keep the column order and rewrite the whole file.

use crate::error::RegistryFormatError;
use crate::models::Feed;
use crate::utils::{join_taxonomy, replace_file, split_taxonomy};
use itertools::Itertools;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Registry columns, in file order.
pub const FEED_FIELDS: [&str; 6] = [
    "name",
    "url",
    "domains",
    "themes",
    "source_ranking",
    "ranking_author",
];

/// Load every feed of the registry at `path`, in file order.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_feeds(path: &Path) -> Result<Vec<Feed>, RegistryFormatError> {
    let file = std::fs::File::open(path).map_err(|source| RegistryFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let feeds = read_feeds(file)?;
    info!(count = feeds.len(), "Loaded feed registry");
    Ok(feeds)
}

/// Parse registry rows from any reader.
pub fn read_feeds<R: std::io::Read>(input: R) -> Result<Vec<Feed>, RegistryFormatError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(input);
    let headers = reader.headers()?.clone();

    let mut columns = [0usize; FEED_FIELDS.len()];
    for (slot, field) in columns.iter_mut().zip(FEED_FIELDS) {
        *slot = headers
            .iter()
            .position(|h| h == field)
            .ok_or(RegistryFormatError::MissingColumn(field))?;
    }
    let [name, url, domains, themes, source_ranking, ranking_author] = columns;

    let mut feeds: Vec<Feed> = Vec::new();
    let mut names = HashSet::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 1;
        let cell = |column: usize| record.get(column).unwrap_or("");

        let ranking_raw = cell(source_ranking);
        let ranking = ranking_raw
            .trim()
            .parse::<i64>()
            .map_err(|_| RegistryFormatError::InvalidInteger {
                row,
                column: "source_ranking",
                value: ranking_raw.to_string(),
            })?;

        if !names.insert(cell(name).to_string()) {
            return Err(RegistryFormatError::DuplicateName {
                row,
                name: cell(name).to_string(),
            });
        }

        feeds.push(Feed {
            name: cell(name).to_string(),
            url: cell(url).trim().to_string(),
            domains: split_taxonomy(cell(domains)),
            themes: split_taxonomy(cell(themes)),
            source_ranking: ranking,
            ranking_author: cell(ranking_author).to_string(),
        });
    }
    debug!(rows = feeds.len(), "Parsed registry rows");
    Ok(feeds)
}

/// Sorted, deduplicated union of every feed's domains.
pub fn available_domains(path: &Path) -> Result<Vec<String>, RegistryFormatError> {
    Ok(union_of(&load_feeds(path)?, |feed| &feed.domains))
}

/// Sorted, deduplicated union of every feed's themes.
pub fn available_themes(path: &Path) -> Result<Vec<String>, RegistryFormatError> {
    Ok(union_of(&load_feeds(path)?, |feed| &feed.themes))
}

fn union_of<F>(feeds: &[Feed], facet: F) -> Vec<String>
where
    F: Fn(&Feed) -> &Vec<String>,
{
    feeds
        .iter()
        .flat_map(|feed| facet(feed).iter().cloned())
        .sorted()
        .dedup()
        .collect()
}

/// Append a feed at the end of the registry.
#[instrument(level = "info", skip_all, fields(path = %path.display(), name = %feed.name))]
pub fn append_feed(path: &Path, feed: Feed) -> Result<(), RegistryFormatError> {
    let mut feeds = load_or_empty(path)?;
    ensure_name_free(&feeds, &feed.name, None)?;
    feeds.push(feed);
    save_feeds(path, &feeds)
}

/// Replace the feed at 0-based `index`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), index = index, name = %feed.name))]
pub fn replace_feed(path: &Path, index: usize, feed: Feed) -> Result<(), RegistryFormatError> {
    let mut feeds = load_feeds(path)?;
    if index >= feeds.len() {
        return Err(RegistryFormatError::NoSuchRow(index));
    }
    ensure_name_free(&feeds, &feed.name, Some(index))?;
    feeds[index] = feed;
    save_feeds(path, &feeds)
}

/// Remove the feed at 0-based `index` and return it.
#[instrument(level = "info", skip_all, fields(path = %path.display(), index = index))]
pub fn remove_feed(path: &Path, index: usize) -> Result<Feed, RegistryFormatError> {
    let mut feeds = load_feeds(path)?;
    if index >= feeds.len() {
        return Err(RegistryFormatError::NoSuchRow(index));
    }
    let removed = feeds.remove(index);
    save_feeds(path, &feeds)?;
    Ok(removed)
}

/// Fail if a feed other than the one at `skip` already uses `name`.
fn ensure_name_free(feeds: &[Feed], name: &str, skip: Option<usize>) -> Result<(), RegistryFormatError> {
    match feeds
        .iter()
        .enumerate()
        .find(|(i, feed)| Some(*i) != skip && feed.name == name)
    {
        Some((i, _)) => Err(RegistryFormatError::DuplicateName {
            row: i + 1,
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

fn load_or_empty(path: &Path) -> Result<Vec<Feed>, RegistryFormatError> {
    if path.exists() {
        load_feeds(path)
    } else {
        Ok(Vec::new())
    }
}

/// Rewrite the whole registry with `feeds`.
pub fn save_feeds(path: &Path, feeds: &[Feed]) -> Result<(), RegistryFormatError> {
    let io_err = |source| RegistryFormatError::Io {
        path: path.to_path_buf(),
        source,
    };
    replace_file(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(FEED_FIELDS)?;
        for feed in feeds {
            let ranking = feed.source_ranking.to_string();
            writer.write_record([
                feed.name.as_str(),
                feed.url.as_str(),
                join_taxonomy(&feed.domains).as_str(),
                join_taxonomy(&feed.themes).as_str(),
                ranking.as_str(),
                feed.ranking_author.as_str(),
            ])?;
        }
        writer.flush()
    })
    .map_err(io_err)?;
    info!(count = feeds.len(), "Saved feed registry");
    Ok(())
}
