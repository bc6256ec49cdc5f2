//! Per-entry extractors used while assembling articles.
//!
//! | Extractor | Module | Input | Fallback |
//! |-----------|--------|-------|----------|
//! | Image URL | [`image`] | structured entry fields, then summary HTML | `None` |
//! | Summary text | [`text::clean_html`] | summary / content HTML | `""` |
//! | Full text | [`text::extract_full_text`] | article page over HTTP | `""` |
//! | Display date | [`text::format_date`] | RFC 2822 date | raw input |
//!
//! None of these abort a refresh: failures degrade to the fallback value.

pub mod image;
pub mod text;
