// src/ingest/descriptor.rs
//! Data-only description of one crawled site.
//!
//! Sites never carry control flow: the generic adapter reads everything it
//! needs (URLs, selector cascade, caps, text templates, canned fallback) from
//! a [`SourceDescriptor`].

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::ingest::types::{NewsRecord, SourceType};

pub const TITLE_MAX_CHARS: usize = 120;
pub const SUMMARY_TITLE_CHARS: usize = 80;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Canned record served when the live crawl is denied or fails.
#[derive(Debug, Clone)]
pub struct FallbackItem {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub details: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub name: String,
    pub source_type: SourceType,
    /// Primary URL first, then alternate paths.
    pub urls: Vec<String>,
    /// CSS selectors tried in order; the first with a non-empty match wins.
    pub selectors: Vec<String>,
    pub title_prefix: String,
    /// `{title}` is replaced by the first 80 chars of the title.
    pub summary_template: String,
    /// Titles must be strictly longer than this (in chars).
    pub min_title_len: usize,
    /// Matches considered per selector.
    pub match_window: usize,
    /// Records kept per crawl.
    pub max_items: usize,
    /// Alternate paths are tried while fewer live records than this were found.
    pub min_live_items: usize,
    /// Build the summary from the post body (`p` text) when present.
    pub summary_from_content: bool,
    pub timeout: Duration,
    pub fallback: Vec<FallbackItem>,
}

impl SourceDescriptor {
    pub fn new(name: &str, source_type: SourceType, url: &str) -> Self {
        Self {
            name: name.to_string(),
            source_type,
            urls: vec![url.to_string()],
            selectors: Vec::new(),
            title_prefix: String::new(),
            summary_template: "{title}...".to_string(),
            min_title_len: 10,
            match_window: 4,
            max_items: 3,
            min_live_items: 1,
            summary_from_content: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fallback: Vec::new(),
        }
    }

    pub fn alt_url(mut self, url: &str) -> Self {
        self.urls.push(url.to_string());
        self
    }

    pub fn selectors(mut self, css: &[&str]) -> Self {
        self.selectors = css.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.title_prefix = prefix.to_string();
        self
    }

    pub fn summary(mut self, template: &str) -> Self {
        self.summary_template = template.to_string();
        self
    }

    pub fn min_title_len(mut self, n: usize) -> Self {
        self.min_title_len = n;
        self
    }

    pub fn caps(mut self, match_window: usize, max_items: usize) -> Self {
        self.match_window = match_window.max(1);
        self.max_items = max_items.max(1);
        self
    }

    pub fn min_live_items(mut self, n: usize) -> Self {
        self.min_live_items = n.max(1);
        self
    }

    pub fn content_summaries(mut self) -> Self {
        self.summary_from_content = true;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn fallback(mut self, title: &str, summary: &str, link: &str) -> Self {
        self.fallback.push(FallbackItem {
            title: title.to_string(),
            summary: summary.to_string(),
            link: link.to_string(),
            details: Vec::new(),
        });
        self
    }

    /// Like [`fallback`](Self::fallback) with extra detail pairs.
    pub fn fallback_with(
        mut self,
        title: &str,
        summary: &str,
        link: &str,
        details: &[(&str, &str)],
    ) -> Self {
        self.fallback.push(FallbackItem {
            title: title.to_string(),
            summary: summary.to_string(),
            link: link.to_string(),
            details: details
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self
    }

    /// Key under which this site's fetches are rate limited.
    pub fn rate_key(&self) -> String {
        format!("fetch:{}", self.name)
    }

    pub fn render_summary(&self, title: &str) -> String {
        let short = crate::ingest::truncate_chars(title, SUMMARY_TITLE_CHARS);
        self.summary_template.replace("{title}", &short)
    }

    /// The canned records, stamped with `captured_at`.
    pub fn fallback_records(&self, captured_at: DateTime<Utc>) -> Vec<NewsRecord> {
        self.fallback
            .iter()
            .map(|item| {
                let mut details: BTreeMap<String, String> = item.details.iter().cloned().collect();
                details.insert("origin".to_string(), "simulated".to_string());
                NewsRecord {
                    title: item.title.clone(),
                    summary: item.summary.clone(),
                    link: item.link.clone(),
                    timestamp: captured_at,
                    source: self.name.clone(),
                    source_type: self.source_type,
                    details,
                    fallback: true,
                }
            })
            .collect()
    }

    /// Same site, different origin: keeps every path and query, swaps scheme/host/port.
    /// Used to point a descriptor at a mirror or a local test server.
    pub fn rebased(mut self, origin: &Url) -> Self {
        self.urls = self
            .urls
            .iter()
            .map(|u| match Url::parse(u) {
                Ok(parsed) => {
                    let mut out = origin.clone();
                    out.set_path(parsed.path());
                    out.set_query(parsed.query());
                    out.to_string()
                }
                Err(_) => u.clone(),
            })
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> SourceDescriptor {
        SourceDescriptor::new("TraderViet", SourceType::Underground, "https://traderviet.com/")
            .alt_url("https://traderviet.com/forum?page=2")
            .summary("Trading analysis from TraderViet - {title}...")
            .fallback("TraderViet: swing plan", "Plan for December.", "https://traderviet.com/")
    }

    #[test]
    fn summary_template_uses_first_80_chars() {
        let d = desc();
        let long = "x".repeat(200);
        let s = d.render_summary(&long);
        assert_eq!(s, format!("Trading analysis from TraderViet - {}...", "x".repeat(80)));
    }

    #[test]
    fn fallback_records_are_tagged() {
        let now = Utc::now();
        let recs = desc().fallback_records(now);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].fallback);
        assert_eq!(recs[0].source_type, SourceType::Underground);
        assert_eq!(recs[0].timestamp, now);
        assert_eq!(recs[0].details.get("origin").map(String::as_str), Some("simulated"));
    }

    #[test]
    fn rebased_keeps_paths() {
        let origin = Url::parse("http://127.0.0.1:4545").unwrap();
        let d = desc().rebased(&origin);
        assert_eq!(d.urls[0], "http://127.0.0.1:4545/");
        assert_eq!(d.urls[1], "http://127.0.0.1:4545/forum?page=2");
        assert_eq!(d.rate_key(), "fetch:TraderViet");
    }
}
