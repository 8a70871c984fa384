// src/ingest/parse.rs
//! Selector cascade over a fetched page.
//!
//! Each selector of a descriptor is tried in order; the first one whose
//! matches (within the descriptor's window) yield a non-empty title wins and
//! later selectors are not consulted.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::ingest::normalize_text;

static TITLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, a").expect("static title selector"));
static LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static link selector"));
static TIME_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("static time selector"));
static CONTENT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static content selector"));

/// Raw item pulled out of one matched element.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

/// Run the cascade. `Err` carries the reason nothing matched.
pub fn extract(
    html: &str,
    page_url: &Url,
    selectors: &[String],
    match_window: usize,
) -> Result<Vec<Candidate>, String> {
    let doc = Html::parse_document(html);

    for css in selectors {
        let Ok(sel) = Selector::parse(css) else {
            tracing::debug!(target: "ingest", selector = %css, "invalid selector skipped");
            continue;
        };
        let found: Vec<Candidate> = doc
            .select(&sel)
            .take(match_window)
            .filter_map(|el| candidate(el, page_url))
            .collect();
        if !found.is_empty() {
            tracing::debug!(target: "ingest", selector = %css, matches = found.len(), "selector matched");
            return Ok(found);
        }
    }
    Err(format!("no selector matched ({} tried)", selectors.len()))
}

fn candidate(el: ElementRef<'_>, page_url: &Url) -> Option<Candidate> {
    let title = title_of(el);
    if title.is_empty() {
        return None;
    }
    Some(Candidate {
        title,
        link: link_of(el, page_url),
        published: published_of(el),
        content: content_of(el),
    })
}

fn is_title_tag(name: &str) -> bool {
    matches!(name, "a" | "h1" | "h2" | "h3" | "h4" | "h5")
}

fn text_of(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn title_of(el: ElementRef<'_>) -> String {
    if is_title_tag(el.value().name()) {
        return text_of(el);
    }
    match el.select(&TITLE_SEL).map(text_of).find(|t| !t.is_empty()) {
        Some(t) => t,
        None => text_of(el),
    }
}

fn link_of(el: ElementRef<'_>, page_url: &Url) -> String {
    let own = (el.value().name() == "a")
        .then(|| el.value().attr("href"))
        .flatten();
    let href = own
        .or_else(|| el.select(&LINK_SEL).find_map(|a| a.value().attr("href")))
        .or_else(|| {
            // `<a href><h3>..</h3></a>` style markup
            el.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| a.value().name() == "a")
                .and_then(|a| a.value().attr("href"))
        });

    match href.map(str::trim).filter(|h| !h.is_empty() && !h.starts_with('#')) {
        Some(h) => page_url
            .join(h)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| page_url.to_string()),
        None => page_url.to_string(),
    }
}

/// Only a machine-readable `<time datetime>` counts: inside the element, or
/// beside it when the match is a bare link/heading.
fn published_of(el: ElementRef<'_>) -> Option<DateTime<Utc>> {
    let scope = if is_title_tag(el.value().name()) {
        el.parent().and_then(ElementRef::wrap).unwrap_or(el)
    } else {
        el
    };
    scope
        .select(&TIME_SEL)
        .filter_map(|t| t.value().attr("datetime"))
        .find_map(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn content_of(el: ElementRef<'_>) -> Option<String> {
    el.select(&CONTENT_SEL)
        .map(text_of)
        .find(|t| !t.is_empty())
}
