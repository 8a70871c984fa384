// src/ingest/mod.rs
pub mod adapter;
pub mod descriptor;
pub mod parse;
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "news_records_total",
            "Records produced by adapters, labelled live or fallback."
        );
        describe_counter!(
            "news_fallback_total",
            "Fallback activations by source and reason."
        );
        describe_counter!(
            "news_source_errors_total",
            "Adapter tasks that errored or panicked."
        );
        describe_counter!("source_fetch_total", "Live fetch attempts by outcome.");
        describe_histogram!("source_fetch_ms", "Live fetch duration in milliseconds.");
        describe_counter!(
            "breaker_transitions_total",
            "Circuit breaker state transitions."
        );
        describe_histogram!("crawl_all_ms", "Full fan-out crawl time in milliseconds.");
    });
}

/// Normalize scraped text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// First `max` chars of `s` (char-, not byte-based).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
