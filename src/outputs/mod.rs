//! Rendering of article listings for the terminal.
//!
//! The read commands build one [`Listing`] and hand it to a renderer:
//!
//! - [`markdown`]: human-readable page with pagination footer
//! - [`json`]: the same listing serialized with `serde_json`
//!
//! When the snapshot could not be read, the listing is empty and carries the
//! errors so the reader knows to run a refresh.

pub mod json;
pub mod markdown;

use crate::models::Article;
use crate::query::Page;
use serde::Serialize;

/// One rendered page of articles plus the request that produced it.
#[derive(Debug, Serialize)]
pub struct Listing<'a> {
    #[serde(flatten)]
    pub page: Page<'a, &'a Article>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<&'a str>,
    pub selected_domains: &'a [String],
    pub selected_themes: &'a [String],
    pub errors: Vec<String>,
}
