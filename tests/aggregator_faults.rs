// tests/aggregator_faults.rs
//
// Fan-in must survive sources that error or panic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use risk_news_aggregator::aggregator::Aggregator;
use risk_news_aggregator::{NewsRecord, NewsSource, SourceType};

enum Behaviour {
    Records(i64),
    Error,
    Panic,
}

struct Scripted {
    name: String,
    behaviour: Behaviour,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl NewsSource for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> SourceType {
        SourceType::Underground
    }

    async fn fetch(&self) -> anyhow::Result<Vec<NewsRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Records(minute) => {
                let ts = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
                    + ChronoDuration::minutes(minute);
                Ok(vec![
                    record(&self.name, ts, 0),
                    record(&self.name, ts - ChronoDuration::seconds(30), 1),
                ])
            }
            Behaviour::Error => Err(anyhow::anyhow!("{} exploded", self.name)),
            Behaviour::Panic => panic!("{} panicked", self.name),
        }
    }
}

fn record(source: &str, ts: chrono::DateTime<Utc>, n: usize) -> NewsRecord {
    NewsRecord {
        title: format!("{source} #{n}"),
        summary: String::new(),
        link: format!("https://example.vn/{source}/{n}"),
        timestamp: ts,
        source: source.to_string(),
        source_type: SourceType::Underground,
        details: Default::default(),
        fallback: false,
    }
}

fn twelve_with_faults(calls: &Arc<AtomicUsize>) -> Vec<Arc<dyn NewsSource>> {
    (0..12)
        .map(|i| {
            let behaviour = match i {
                2 | 7 => Behaviour::Error,
                10 => Behaviour::Panic,
                _ => Behaviour::Records(i),
            };
            Arc::new(Scripted {
                name: format!("S{i:02}"),
                behaviour,
                calls: calls.clone(),
            }) as Arc<dyn NewsSource>
        })
        .collect()
}

#[tokio::test]
async fn three_faulty_sources_out_of_twelve() {
    let calls = Arc::new(AtomicUsize::new(0));
    let agg = Aggregator::new(twelve_with_faults(&calls), 100);
    let out = agg.crawl_all().await;

    assert_eq!(calls.load(Ordering::SeqCst), 12, "every source was invoked");
    assert_eq!(out.len(), 9 * 2);
    for bad in ["S02", "S07", "S10"] {
        assert!(out.iter().all(|r| r.source != bad), "{bad} leaked records");
    }
    assert!(out.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(out[0].source, "S11");
}

#[tokio::test]
async fn merged_result_is_truncated_to_max_results() {
    let calls = Arc::new(AtomicUsize::new(0));
    let agg = Aggregator::new(twelve_with_faults(&calls), 5);
    let out = agg.crawl_all().await;

    assert_eq!(out.len(), 5);
    let sources: Vec<_> = out.iter().map(|r| r.source.as_str()).collect();
    // newest minute first, each source's pair stays adjacent
    assert_eq!(sources, vec!["S11", "S11", "S09", "S09", "S08"]);
}

#[tokio::test]
async fn all_sources_failing_yields_empty_not_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sources: Vec<Arc<dyn NewsSource>> = (0..3)
        .map(|i| {
            Arc::new(Scripted {
                name: format!("E{i}"),
                behaviour: if i == 0 { Behaviour::Panic } else { Behaviour::Error },
                calls: calls.clone(),
            }) as Arc<dyn NewsSource>
        })
        .collect();
    let out = Aggregator::new(sources, 20).crawl_all().await;
    assert!(out.is_empty());
}
