//! Best-effort image discovery for a feed entry.

use crate::models::{FeedEntry, ImageRef, MediaRef};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("static selector"));

/// Derive an image URL for `entry`.
///
/// Strategies, first non-empty result wins:
///
/// 1. first `media:content` element's `url`
/// 2. first `media:thumbnail` element's `url`
/// 3. the entry's `<image>` object: `url`, then `href`, then `link`
/// 4. `src` of the first `<img>` in the summary HTML, or in the first
///    content block when there is one
///
/// Structured media metadata always wins over an image found in free text.
/// A relative `<img src>` is resolved against the entry link when possible.
pub fn extract_image(entry: &FeedEntry) -> Option<String> {
    first_media_url(&entry.media_content)
        .or_else(|| first_media_url(&entry.media_thumbnail))
        .or_else(|| entry.image.as_ref().and_then(image_object_url))
        .or_else(|| {
            let html = entry.first_content().unwrap_or_else(|| entry.summary());
            first_img_src(html).map(|src| resolve_against(&src, entry.link()))
        })
}

fn first_media_url(media: &[MediaRef]) -> Option<String> {
    media.first().and_then(|m| usable(m.url.as_deref()))
}

fn image_object_url(image: &ImageRef) -> Option<String> {
    usable(image.url.as_deref())
        .or_else(|| usable(image.href.as_deref()))
        .or_else(|| usable(image.link.as_deref()))
}

fn first_img_src(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }
    let fragment = Html::parse_fragment(html);
    let img = fragment.select(&IMG).next()?;
    usable(img.value().attr("src"))
}

fn resolve_against(src: &str, link: &str) -> String {
    if Url::parse(src).is_ok() {
        return src.to_string();
    }
    Url::parse(link)
        .and_then(|base| base.join(src))
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| src.to_string())
}

fn usable(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
