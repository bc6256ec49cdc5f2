//! Error taxonomy for the ingestion pipeline and the snapshot cache.
//!
//! Input-shape errors ([`RegistryFormatError`], [`SnapshotFormatError`]) are
//! surfaced to callers. Per-item failures ([`FeedFetchError`],
//! [`ExtractionFailure`]) are recorded or absorbed by the assembler and never
//! interrupt a refresh.

use std::path::PathBuf;
use thiserror::Error;

/// The feed registry could not be loaded. Fatal to a refresh.
#[derive(Debug, Error)]
pub enum RegistryFormatError {
    #[error("cannot read feed registry {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed feed registry: {0}")]
    Csv(#[from] csv::Error),

    #[error("feed registry is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("feed registry row {row}: column `{column}` is not an integer: {value:?}")]
    InvalidInteger {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("feed registry row {row}: feed name {name:?} is already used")]
    DuplicateName { row: usize, name: String },

    #[error("no feed registry row at position {0}")]
    NoSuchRow(usize),
}

/// A single HTTP request failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// One feed could not be fetched or parsed. Recorded and skipped.
#[derive(Debug, Error)]
pub enum FeedFetchError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("not a well-formed feed document: {0}")]
    Parse(String),
}

impl From<quick_xml::Error> for FeedFetchError {
    fn from(e: quick_xml::Error) -> Self {
        FeedFetchError::Parse(e.to_string())
    }
}

/// Best-effort extraction produced nothing. Degrades to an empty value.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error("entry has no link")]
    MissingLink,

    #[error("article page fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("article page has no paragraph text")]
    NoContent,
}

/// The article snapshot cannot be trusted. Callers receive an empty set.
#[derive(Debug, Error)]
pub enum SnapshotFormatError {
    #[error("article cache {} is missing; run a refresh", .0.display())]
    Missing(PathBuf),

    #[error("article cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed article cache: {0}")]
    Csv(#[from] csv::Error),

    #[error("article cache is incomplete or outdated (missing columns: {})", .missing.join(", "))]
    IncompleteSchema { missing: Vec<&'static str> },

    #[error("article cache row {row}: column `{column}` is not an integer: {value:?}")]
    InvalidInteger {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// The configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A refresh was aborted before the snapshot could be replaced.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Registry(#[from] RegistryFormatError),

    #[error("cannot build HTTP client: {0}")]
    Client(#[from] FetchError),

    #[error("cannot write article cache: {0}")]
    Snapshot(#[from] SnapshotFormatError),
}
