//! Article snapshot: the CSV cache every read path is served from.
//!
//! # Format
//!
//! ```text
//! id,source,domains,themes,title,link,published,summary,full_text,image_url,
//! source_ranking,article_ranking,ranking_author,feasibility_score,feasibility_author,fetched_at
//! ```
//!
//! `id` is the 1-based position at write time and is reassigned on every
//! write. `domains`/`themes` are comma-joined. Fields are quoted only when
//! they contain delimiters, quotes or newlines.
//!
//! # Full replace
//!
//! [`write`] replaces the whole file through a temporary sibling and a
//! rename, so readers see either the previous snapshot or the new one.
//! [`try_read`] refuses snapshots that lack any of [`REQUIRED_FIELDS`] or
//! hold a non-numeric ranking; it never returns a partial article set.

use crate::error::SnapshotFormatError;
use crate::models::Article;
use crate::utils::{join_taxonomy, replace_file, split_taxonomy};
use csv::StringRecord;
use serde::Serialize;
use std::io;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Snapshot columns, in file order.
pub const SNAPSHOT_FIELDS: [&str; 16] = [
    "id",
    "source",
    "domains",
    "themes",
    "title",
    "link",
    "published",
    "summary",
    "full_text",
    "image_url",
    "source_ranking",
    "article_ranking",
    "ranking_author",
    "feasibility_score",
    "feasibility_author",
    "fetched_at",
];

/// Columns a snapshot must have to be trusted.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "source",
    "domains",
    "themes",
    "title",
    "summary",
    "full_text",
    "source_ranking",
    "article_ranking",
    "feasibility_score",
];

#[derive(Serialize)]
struct SnapshotRow<'a> {
    id: usize,
    source: &'a str,
    domains: String,
    themes: String,
    title: &'a str,
    link: &'a str,
    published: &'a str,
    summary: &'a str,
    full_text: &'a str,
    image_url: &'a str,
    source_ranking: i64,
    article_ranking: i64,
    ranking_author: &'a str,
    feasibility_score: i64,
    feasibility_author: &'a str,
    fetched_at: &'a str,
}

impl<'a> SnapshotRow<'a> {
    fn new(id: usize, article: &'a Article) -> Self {
        Self {
            id,
            source: &article.source,
            domains: join_taxonomy(&article.domains),
            themes: join_taxonomy(&article.themes),
            title: &article.title,
            link: &article.link,
            published: &article.published,
            summary: &article.summary,
            full_text: &article.full_text,
            image_url: article.image_url.as_deref().unwrap_or(""),
            source_ranking: article.source_ranking,
            article_ranking: article.article_ranking,
            ranking_author: &article.ranking_author,
            feasibility_score: article.feasibility_score,
            feasibility_author: &article.feasibility_author,
            fetched_at: &article.fetched_at,
        }
    }
}

/// Replace the snapshot at `path` with `articles`, in order.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub fn write(path: &Path, articles: &[Article]) -> Result<(), SnapshotFormatError> {
    replace_file(path, |file| {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(SNAPSHOT_FIELDS)?;
        for (index, article) in articles.iter().enumerate() {
            writer.serialize(SnapshotRow::new(index + 1, article))?;
        }
        writer.flush()
    })?;
    info!("Wrote article snapshot");
    Ok(())
}

/// Read the snapshot at `path`, or explain why it cannot be trusted.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn try_read(path: &Path) -> Result<Vec<Article>, SnapshotFormatError> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SnapshotFormatError::Missing(path.to_path_buf()),
        _ => SnapshotFormatError::Io(e),
    })?;
    let articles = read_articles(file)?;
    info!(count = articles.len(), "Loaded article snapshot");
    Ok(articles)
}

/// Read the snapshot at `path` as `(articles, errors)`.
///
/// Exactly one side is non-empty on failure: the article list is empty and
/// the error list explains why. A readable empty snapshot gives two empty
/// lists.
pub fn read(path: &Path) -> (Vec<Article>, Vec<SnapshotFormatError>) {
    match try_read(path) {
        Ok(articles) => (articles, Vec::new()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Article snapshot unavailable");
            (Vec::new(), vec![e])
        }
    }
}

/// Column positions of one snapshot header.
struct Columns {
    positions: [Option<usize>; SNAPSHOT_FIELDS.len()],
}

impl Columns {
    fn from_header(header: &StringRecord) -> Result<Self, SnapshotFormatError> {
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|field| !header.iter().any(|h| h == *field))
            .collect();
        if !missing.is_empty() {
            return Err(SnapshotFormatError::IncompleteSchema { missing });
        }

        let mut positions = [None; SNAPSHOT_FIELDS.len()];
        for (slot, field) in positions.iter_mut().zip(SNAPSHOT_FIELDS) {
            *slot = header.iter().position(|h| h == field);
        }
        Ok(Self { positions })
    }

    fn get<'r>(&self, record: &'r StringRecord, field: &str) -> &'r str {
        SNAPSHOT_FIELDS
            .iter()
            .position(|f| *f == field)
            .and_then(|i| self.positions[i])
            .and_then(|column| record.get(column))
            .unwrap_or("")
    }

    fn integer(&self, record: &StringRecord, row: usize, field: &'static str) -> Result<i64, SnapshotFormatError> {
        let raw = self.get(record, field);
        raw.trim()
            .parse()
            .map_err(|_| SnapshotFormatError::InvalidInteger {
                row,
                column: field,
                value: raw.to_string(),
            })
    }
}

fn read_articles<R: io::Read>(input: R) -> Result<Vec<Article>, SnapshotFormatError> {
    let mut reader = csv::Reader::from_reader(input);
    let columns = Columns::from_header(reader.headers()?)?;

    let mut articles = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = index + 1;
        let text = |field| columns.get(&record, field).to_string();
        let image_url = columns.get(&record, "image_url");

        articles.push(Article {
            source: text("source"),
            domains: split_taxonomy(columns.get(&record, "domains")),
            themes: split_taxonomy(columns.get(&record, "themes")),
            title: text("title"),
            link: text("link"),
            published: text("published"),
            summary: text("summary"),
            full_text: text("full_text"),
            image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
            source_ranking: columns.integer(&record, row, "source_ranking")?,
            article_ranking: columns.integer(&record, row, "article_ranking")?,
            ranking_author: text("ranking_author"),
            feasibility_score: columns.integer(&record, row, "feasibility_score")?,
            feasibility_author: text("feasibility_author"),
            fetched_at: text("fetched_at"),
        });
    }
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str) -> Article {
        Article {
            source: "Tech Daily".into(),
            domains: vec!["IoT".into(), "Cloud".into()],
            themes: vec!["Security".into()],
            title: title.into(),
            link: format!("https://tech.example/{}", title.to_lowercase()),
            published: "06 May 2025 – 14:30".into(),
            summary: "Short, with a comma and \"quotes\"".into(),
            full_text: "Line one\nline two".into(),
            image_url: Some("https://cdn.example/a.jpg".into()),
            source_ranking: 7,
            article_ranking: 7,
            ranking_author: "alice".into(),
            feasibility_score: 0,
            feasibility_author: String::new(),
            fetched_at: "18 October 2026 – 09:00".into(),
        }
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let mut second = article("Second");
        second.image_url = None;
        second.themes = vec!["Grid".into(), "Storage".into()];
        let articles = vec![article("First"), second];

        write(&path, &articles).unwrap();
        let (loaded, errors) = read(&path);

        assert!(errors.is_empty());
        assert_eq!(loaded, articles);
    }

    #[test]
    fn test_header_and_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        write(&path, &[article("A"), article("B"), article("C")]).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with(&SNAPSHOT_FIELDS.join(",")));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let ids: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_write_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        write(&path, &[article("A"), article("B")]).unwrap();
        write(&path, &[article("C")]).unwrap();

        let loaded = try_read(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].title, "C");
    }

    #[test]
    fn test_empty_snapshot_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        write(&path, &[]).unwrap();

        let (loaded, errors) = read(&path);
        assert!(loaded.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (loaded, errors) = read(&dir.path().join("absent.csv"));
        assert!(loaded.is_empty());
        assert!(matches!(errors.as_slice(), [SnapshotFormatError::Missing(_)]));
    }

    #[test]
    fn test_missing_full_text_column_rejects_whole_file() {
        let csv = "\
id,source,domains,themes,title,summary,source_ranking,article_ranking,feasibility_score
1,S,D,T,Title,Sum,1,1,0
";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        std::fs::write(&path, csv).unwrap();

        let (loaded, errors) = read(&path);
        assert!(loaded.is_empty());
        match errors.as_slice() {
            [SnapshotFormatError::IncompleteSchema { missing }] => {
                assert_eq!(missing, &vec!["full_text"]);
            }
            other => panic!("unexpected errors: {other:?}"),
        }
    }

    #[test]
    fn test_optional_columns_default() {
        let csv = "\
source,domains,themes,title,summary,full_text,source_ranking,article_ranking,feasibility_score
S, IoT , Grid,Title,Sum,Body,3,4,0
";
        let articles = read_articles(csv.as_bytes()).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].domains, vec!["IoT"]);
        assert_eq!(articles[0].article_ranking, 4);
        assert_eq!(articles[0].link, "");
        assert_eq!(articles[0].image_url, None);
    }

    #[test]
    fn test_non_numeric_ranking_fails_whole_read() {
        let csv = "\
source,domains,themes,title,summary,full_text,source_ranking,article_ranking,feasibility_score
S,D,T,Good,Sum,Body,3,3,0
S,D,T,Bad,Sum,Body,3,three,0
";
        match read_articles(csv.as_bytes()).unwrap_err() {
            SnapshotFormatError::InvalidInteger { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "article_ranking");
                assert_eq!(value, "three");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_file_is_incomplete() {
        assert!(matches!(
            read_articles("".as_bytes()),
            Err(SnapshotFormatError::IncompleteSchema { .. })
        ));
    }
}
