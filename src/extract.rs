use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::models::ImageReference;

static REMOTE_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Collect the `src` of every `<img>` that points at an absolute http(s) URL,
/// in document order. Repeated URLs are kept.
///
/// The html5ever tree builder recovers from unclosed or stray tags, so broken
/// markup still yields whatever images it can find.
pub fn remote_image_sources(html: &str) -> Vec<ImageReference> {
    let document = Html::parse_document(html);
    document
        .select(&IMG_SEL)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| is_remote(src))
        .map(|src| src.to_string())
        .collect()
}

pub fn is_remote(src: &str) -> bool {
    REMOTE_URL_RE.is_match(src)
}

/// Drop repeats while keeping first-seen order.
pub fn dedup_preserving_order(sources: Vec<ImageReference>) -> Vec<ImageReference> {
    let mut seen = std::collections::HashSet::new();
    sources
        .into_iter()
        .filter(|src| seen.insert(src.clone()))
        .collect()
}
