//! Read-side queries over an in-memory article set.
//!
//! All three operations borrow their input and compose freely:
//! `paginate(&search(filter(&articles, ..), q), page, per_page)`.

use crate::models::Article;
use serde::Serialize;

/// Keep articles matching the selected taxonomy.
///
/// Within a facet any selected value is enough (OR); when both facets are
/// given an article must match each of them (AND). An empty selection puts
/// no constraint on its facet.
pub fn filter<'a, I>(articles: I, domains: &[String], themes: &[String]) -> Vec<&'a Article>
where
    I: IntoIterator<Item = &'a Article>,
{
    articles
        .into_iter()
        .filter(|a| matches_facet(&a.domains, domains) && matches_facet(&a.themes, themes))
        .collect()
}

fn matches_facet(values: &[String], selected: &[String]) -> bool {
    selected.is_empty() || selected.iter().any(|s| values.contains(s))
}

/// Case-insensitive substring search over title, summary and full text.
///
/// A query that is empty after trimming matches every article.
pub fn search<'a, I>(articles: I, query: &str) -> Vec<&'a Article>
where
    I: IntoIterator<Item = &'a Article>,
{
    let needle = query.trim().to_lowercase();
    articles
        .into_iter()
        .filter(|a| {
            needle.is_empty()
                || [&a.title, &a.summary, &a.full_text]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// One page of a result list.
#[derive(Debug, Serialize)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based.
    pub page: usize,
    /// Never less than 1.
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice out 1-based `page` of `per_page` items.
///
/// `total_pages` is `ceil(len / per_page)` with a minimum of 1. Page 0 is
/// treated as page 1 and a `per_page` of 0 as 1; a page past the end is
/// empty.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);

    let start = (page - 1).saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());

    Page {
        items: &items[start..end],
        page,
        total_pages,
        total_items: items.len(),
    }
}
