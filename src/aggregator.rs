// src/aggregator.rs
//! Fan-out over every source, fault-tolerant fan-in.

use futures::future::join_all;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::config::CrawlConfig;
use crate::context::ResilienceContext;
use crate::ingest::ensure_metrics_described;
use crate::ingest::providers::default_sources;
use crate::ingest::types::{NewsRecord, NewsSource};

pub const DEFAULT_MAX_RESULTS: usize = 20;

pub struct Aggregator {
    sources: Vec<Arc<dyn NewsSource>>,
    max_results: usize,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn NewsSource>>, max_results: usize) -> Self {
        Self {
            sources,
            max_results,
        }
    }

    /// Every catalogued site, wired to `ctx`.
    pub fn from_catalog(ctx: Arc<ResilienceContext>, cfg: &CrawlConfig) -> Self {
        Self::new(default_sources(ctx), cfg.max_results)
    }

    pub fn sources(&self) -> &[Arc<dyn NewsSource>] {
        &self.sources
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Run every source concurrently and merge.
    ///
    /// A source that errors or panics contributes nothing. The merge is a
    /// stable sort by timestamp (newest first) over contributions laid out in
    /// source order, so ties never depend on completion order.
    pub async fn crawl_all(&self) -> Vec<NewsRecord> {
        ensure_metrics_described();
        let started = Instant::now();

        let handles = self.sources.iter().map(|src| {
            let src = Arc::clone(src);
            tokio::spawn(async move { src.fetch().await })
        });
        let settled = join_all(handles).await;

        let mut merged: Vec<NewsRecord> = Vec::new();
        let mut faults = 0usize;
        for (src, outcome) in self.sources.iter().zip(settled) {
            match outcome {
                Ok(Ok(mut records)) => merged.append(&mut records),
                Ok(Err(e)) => {
                    faults += 1;
                    warn!(target: "aggregator", source = src.name(), error = ?e, "source errored");
                    counter!("news_source_errors_total", "source" => src.name().to_string(), "kind" => "error")
                        .increment(1);
                }
                Err(join_err) => {
                    faults += 1;
                    warn!(target: "aggregator", source = src.name(), error = %join_err, "source task failed");
                    counter!("news_source_errors_total", "source" => src.name().to_string(), "kind" => "panic")
                        .increment(1);
                }
            }
        }

        let fetched = merged.len();
        merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        merged.truncate(self.max_results);

        let elapsed = started.elapsed();
        histogram!("crawl_all_ms").record(elapsed.as_secs_f64() * 1_000.0);
        info!(
            target: "aggregator",
            sources = self.sources.len(),
            faults,
            fetched,
            kept = merged.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "crawl finished"
        );
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceType;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    struct Fixed {
        name: &'static str,
        offsets: Vec<i64>,
    }

    #[async_trait]
    impl NewsSource for Fixed {
        fn name(&self) -> &str {
            self.name
        }
        fn source_type(&self) -> SourceType {
            SourceType::Official
        }
        async fn fetch(&self) -> anyhow::Result<Vec<NewsRecord>> {
            let base = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
            Ok(self
                .offsets
                .iter()
                .map(|o| NewsRecord {
                    title: format!("{} item {o}", self.name),
                    summary: String::new(),
                    link: String::new(),
                    timestamp: base + ChronoDuration::minutes(*o),
                    source: self.name.to_string(),
                    source_type: SourceType::Official,
                    details: Default::default(),
                    fallback: false,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn sorted_newest_first_and_truncated() {
        let agg = Aggregator::new(
            vec![
                Arc::new(Fixed { name: "a", offsets: vec![1, 5] }),
                Arc::new(Fixed { name: "b", offsets: vec![3, 4, 2] }),
            ],
            3,
        );
        let out = agg.crawl_all().await;
        let titles: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a item 5", "b item 4", "b item 3"]);
    }

    #[tokio::test]
    async fn ties_keep_source_order() {
        let agg = Aggregator::new(
            vec![
                Arc::new(Fixed { name: "first", offsets: vec![0] }),
                Arc::new(Fixed { name: "second", offsets: vec![0] }),
            ],
            DEFAULT_MAX_RESULTS,
        );
        let out = agg.crawl_all().await;
        assert_eq!(out[0].source, "first");
        assert_eq!(out[1].source, "second");
    }

    #[tokio::test]
    async fn no_sources_no_records() {
        let agg = Aggregator::new(Vec::new(), DEFAULT_MAX_RESULTS);
        assert!(agg.crawl_all().await.is_empty());
    }
}
