// src/ingest/adapter.rs
//! Generic site adapter: one implementation, driven by a [`SourceDescriptor`].
//!
//! Per fetch: breaker gate, rate-limit slot, pooled GET(s), selector cascade,
//! normalization, breaker/monitor bookkeeping. Any denial or failure serves
//! the descriptor's canned records, so `fetch` never comes back empty-handed
//! for a site that has fallback content.

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::context::ResilienceContext;
use crate::error::FetchError;
use crate::http::HttpHandle;
use crate::ingest::descriptor::{SourceDescriptor, TITLE_MAX_CHARS};
use crate::ingest::parse::{self, Candidate};
use crate::ingest::types::{NewsRecord, NewsSource, SourceType};
use crate::ingest::{ensure_metrics_described, truncate_chars};

const CONTENT_SUMMARY_CHARS: usize = 150;

pub struct SourceAdapter {
    desc: Arc<SourceDescriptor>,
    ctx: Arc<ResilienceContext>,
}

impl SourceAdapter {
    pub fn new(desc: SourceDescriptor, ctx: Arc<ResilienceContext>) -> Self {
        Self {
            desc: Arc::new(desc),
            ctx,
        }
    }

    pub fn descriptor(&self) -> &SourceDescriptor {
        &self.desc
    }

    /// Full fetch procedure; never fails.
    #[instrument(level = "debug", skip_all, fields(source = %self.desc.name))]
    pub async fn fetch_records(&self) -> Vec<NewsRecord> {
        ensure_metrics_described();
        let name = self.desc.name.as_str();

        if self.ctx.offline() {
            return self.serve_fallback("offline");
        }
        // Held across the awaits below: if this future is dropped or panics,
        // an unsettled HalfOpen probe goes back to the breaker.
        let Some(permit) = self.ctx.breaker.try_call(name) else {
            debug!(target: "ingest", source = name, "circuit open, skipping live fetch");
            return self.serve_fallback("circuit_open");
        };
        if !self
            .ctx
            .limiter
            .acquire(&self.desc.rate_key(), self.ctx.rate_wait())
            .await
        {
            drop(permit);
            return self.serve_fallback("rate_limited");
        }

        let started = Instant::now();
        let outcome = self.crawl().await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(records) => {
                permit.succeeded();
                self.ctx.monitor.record_call(name, elapsed, true);
                info!(
                    target: "ingest",
                    source = name,
                    count = records.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "live records"
                );
                counter!("news_records_total", "source" => name.to_string(), "origin" => "live")
                    .increment(records.len() as u64);
                records
            }
            Err(e) => {
                if e.is_reachability() {
                    permit.failed();
                } else {
                    // page loaded, markup changed: not the site's availability
                    permit.succeeded();
                }
                self.ctx.monitor.record_call(name, elapsed, false);
                warn!(target: "ingest", source = name, kind = e.kind(), error = %e, "live fetch failed");
                self.serve_fallback(e.kind())
            }
        }
    }

    /// Canned records for this site, stamped now.
    pub fn fallback_records(&self) -> Vec<NewsRecord> {
        self.desc.fallback_records(Utc::now())
    }

    fn serve_fallback(&self, reason: &'static str) -> Vec<NewsRecord> {
        let name = self.desc.name.clone();
        debug!(target: "ingest", source = %name, reason, "serving fallback");
        counter!("news_fallback_total", "source" => name.clone(), "reason" => reason).increment(1);
        let records = self.fallback_records();
        counter!("news_records_total", "source" => name, "origin" => "fallback")
            .increment(records.len() as u64);
        records
    }

    /// Walk the primary URL then alternates until enough live records are found.
    async fn crawl(&self) -> Result<Vec<NewsRecord>, FetchError> {
        let desc = &self.desc;
        let primary = desc.urls.first().cloned().unwrap_or_default();
        let http = self.ctx.http.acquire()?;

        let mut records: Vec<NewsRecord> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut reached = false;
        let mut last_err: Option<FetchError> = None;

        for url in &desc.urls {
            match self.fetch_page(&http, url).await {
                Ok((page_url, body)) => {
                    reached = true;
                    match parse::extract(&body, &page_url, &desc.selectors, desc.match_window) {
                        Ok(found) => {
                            for rec in found.into_iter().filter_map(|c| self.to_record(c)) {
                                if seen.insert((rec.title.clone(), rec.link.clone())) {
                                    records.push(rec);
                                }
                            }
                        }
                        Err(reason) => {
                            last_err = Some(FetchError::Parse {
                                url: url.clone(),
                                reason,
                            });
                        }
                    }
                }
                Err(e) => {
                    debug!(target: "ingest", source = %desc.name, %url, error = %e, "page unavailable");
                    last_err = Some(e);
                }
            }
            if records.len() >= desc.min_live_items {
                break;
            }
        }

        records.truncate(desc.max_items);
        if !records.is_empty() {
            return Ok(records);
        }
        if reached {
            // at least one page loaded: nothing usable is a parse problem
            return Err(match last_err {
                Some(e @ FetchError::Parse { .. }) => e,
                _ => FetchError::Parse {
                    url: primary,
                    reason: "no titles above minimum length".to_string(),
                },
            });
        }
        Err(last_err.unwrap_or(FetchError::Parse {
            url: primary,
            reason: "no urls configured".to_string(),
        }))
    }

    async fn fetch_page(&self, http: &HttpHandle, url: &str) -> Result<(Url, String), FetchError> {
        let page_url = Url::parse(url).map_err(|e| FetchError::Parse {
            url: url.to_string(),
            reason: format!("invalid url: {e}"),
        })?;
        let resp = http.get(url, &[], self.desc.timeout).await?;
        if !resp.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status,
            });
        }
        Ok((page_url, resp.body))
    }

    fn to_record(&self, c: Candidate) -> Option<NewsRecord> {
        let desc = &self.desc;
        if c.title.chars().count() <= desc.min_title_len {
            return None;
        }
        let title = truncate_chars(&c.title, TITLE_MAX_CHARS);

        let summary = match (&c.content, desc.summary_from_content) {
            (Some(body), true) => format!("{}...", truncate_chars(body, CONTENT_SUMMARY_CHARS)),
            _ => desc.render_summary(&title),
        };

        let mut details = BTreeMap::new();
        details.insert("origin".to_string(), "live".to_string());
        if c.published.is_some() {
            details.insert("time_source".to_string(), "page".to_string());
        }

        Some(NewsRecord {
            title: format!("{}{}", desc.title_prefix, title),
            summary,
            link: c.link,
            timestamp: c.published.unwrap_or_else(Utc::now),
            source: desc.name.clone(),
            source_type: desc.source_type,
            details,
            fallback: false,
        })
    }
}

#[async_trait]
impl NewsSource for SourceAdapter {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn source_type(&self) -> SourceType {
        self.desc.source_type
    }

    async fn fetch(&self) -> anyhow::Result<Vec<NewsRecord>> {
        Ok(self.fetch_records().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitState;
    use crate::config::AggregatorConfig;

    fn unreachable_site() -> SourceDescriptor {
        SourceDescriptor::new("StockBook", SourceType::Underground, "http://127.0.0.1:9/")
            .selectors(&["h3 a"])
            .timeout_secs(2)
            .fallback("StockBook: community picks", "Picks of the week.", "https://stockbook.vn/")
    }

    #[tokio::test]
    async fn offline_serves_fallback_without_touching_breaker() {
        let ctx = ResilienceContext::shared(&AggregatorConfig::offline());
        let a = SourceAdapter::new(unreachable_site(), ctx.clone());
        let recs = a.fetch_records().await;
        assert_eq!(recs.len(), 1);
        assert!(recs[0].fallback);
        assert!(ctx.breaker.snapshot().is_empty());
        assert!(!ctx.http.is_open());
    }

    #[tokio::test]
    async fn unreachable_site_counts_a_failure_and_falls_back() {
        let ctx = ResilienceContext::shared(&AggregatorConfig::default());
        let a = SourceAdapter::new(unreachable_site(), ctx.clone());
        let recs = a.fetch_records().await;
        assert!(recs.iter().all(|r| r.fallback));
        assert_eq!(ctx.breaker.failure_count("StockBook"), 1);
        assert_eq!(ctx.monitor.stats("StockBook").total_calls, 1);
    }

    #[tokio::test]
    async fn open_circuit_skips_the_network() {
        let ctx = ResilienceContext::shared(&AggregatorConfig::default());
        for _ in 0..5 {
            ctx.breaker.record_failure("StockBook");
        }
        assert_eq!(ctx.breaker.state("StockBook"), CircuitState::Open);
        let a = SourceAdapter::new(unreachable_site(), ctx.clone());
        let recs = a.fetch_records().await;
        assert_eq!(recs.len(), 1);
        assert_eq!(ctx.monitor.stats("StockBook").total_calls, 0);
    }

    #[tokio::test]
    async fn exhausted_rate_limit_serves_fallback() {
        let mut cfg = AggregatorConfig::default();
        cfg.rate_limit.max_calls = 1;
        cfg.rate_limit.max_wait_ms = 0;
        let ctx = ResilienceContext::shared(&cfg);
        assert!(ctx.limiter.is_allowed("fetch:StockBook"));
        let a = SourceAdapter::new(unreachable_site(), ctx.clone());
        let recs = a.fetch_records().await;
        assert!(recs[0].fallback);
        // never reached the network
        assert_eq!(ctx.breaker.failure_count("StockBook"), 0);
    }

    #[test]
    fn short_titles_are_dropped_and_long_ones_truncated() {
        let ctx = ResilienceContext::shared(&AggregatorConfig::offline());
        let a = SourceAdapter::new(unreachable_site().prefix("SB: ").min_title_len(10), ctx);
        let short = Candidate {
            title: "VN30 tăng".into(),
            link: "https://stockbook.vn/a".into(),
            published: None,
            content: None,
        };
        assert!(a.to_record(short).is_none());

        let long = Candidate {
            title: "a".repeat(300),
            link: "https://stockbook.vn/b".into(),
            published: None,
            content: None,
        };
        let rec = a.to_record(long).unwrap();
        assert_eq!(rec.title.chars().count(), 4 + TITLE_MAX_CHARS);
        assert!(rec.title.starts_with("SB: "));
        assert!(!rec.fallback);
    }
}
