// src/service.rs
//! `get_news_by_risk_profile`: the one entry point callers need.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::aggregator::Aggregator;
use crate::config::AggregatorConfig;
use crate::context::ResilienceContext;
use crate::ingest::types::NewsRecord;
use crate::risk::{
    self, classify, crawl_summary, recommendation, select_news, CrawlSummary, NewsPolicy,
    Recommendation, RiskProfile,
};

#[derive(Debug, Clone, Serialize)]
pub struct RiskNewsPayload {
    pub risk_profile: RiskProfile,
    pub policy: NewsPolicy,
    pub source_info: String,
    pub news: Vec<NewsRecord>,
    pub total_news: usize,
    pub distinct_sources: usize,
    /// Records merged before curation.
    pub sources_crawled: usize,
    pub recommendation: Recommendation,
    pub crawl_summary: CrawlSummary,
    pub time_horizon: String,
    pub investment_amount: i64,
    pub generated_at: DateTime<Utc>,
}

/// Either a payload or `{ "error": "..." }` on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NewsResponse {
    Payload(Box<RiskNewsPayload>),
    Error { error: String },
}

impl NewsResponse {
    pub fn error(msg: impl Into<String>) -> Self {
        NewsResponse::Error { error: msg.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, NewsResponse::Error { .. })
    }

    pub fn payload(&self) -> Option<&RiskNewsPayload> {
        match self {
            NewsResponse::Payload(p) => Some(p),
            NewsResponse::Error { .. } => None,
        }
    }
}

pub struct NewsService {
    ctx: Arc<ResilienceContext>,
    aggregator: Arc<Aggregator>,
}

impl NewsService {
    pub fn new(ctx: Arc<ResilienceContext>, aggregator: Aggregator) -> Self {
        Self {
            ctx,
            aggregator: Arc::new(aggregator),
        }
    }

    /// Context plus the full site catalog.
    pub fn from_config(cfg: &AggregatorConfig) -> Self {
        let ctx = ResilienceContext::shared(cfg);
        let aggregator = Aggregator::from_catalog(ctx.clone(), &cfg.crawl);
        Self::new(ctx, aggregator)
    }

    pub fn context(&self) -> &Arc<ResilienceContext> {
        &self.ctx
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Never fails: bad input and crawl faults come back as an error payload.
    #[instrument(level = "info", skip(self))]
    pub async fn get_news_by_risk_profile(
        &self,
        tolerance: i32,
        time_horizon: &str,
        investment_amount: i64,
    ) -> NewsResponse {
        if !(0..=100).contains(&tolerance) {
            return NewsResponse::error(format!(
                "risk tolerance must be within 0..=100, got {tolerance}"
            ));
        }
        let profile = classify(tolerance);

        // own task so a panic anywhere in the crawl is contained here
        let agg = Arc::clone(&self.aggregator);
        let all = match tokio::spawn(async move { agg.crawl_all().await }).await {
            Ok(all) => all,
            Err(e) => {
                error!(target: "service", error = %e, "crawl failed");
                return NewsResponse::error(format!("risk-based news error: {e}"));
            }
        };

        let news = select_news(profile, &all);
        let policy = profile.policy();
        info!(
            target: "service",
            %profile,
            policy = policy.label(),
            crawled = all.len(),
            selected = news.len(),
            "news curated"
        );

        NewsResponse::Payload(Box::new(RiskNewsPayload {
            risk_profile: profile,
            policy,
            source_info: policy.source_info().to_string(),
            total_news: news.len(),
            distinct_sources: risk::distinct_sources(&news),
            sources_crawled: all.len(),
            recommendation: recommendation(profile, time_horizon),
            crawl_summary: crawl_summary(&all, self.aggregator.sources().len()),
            time_horizon: time_horizon.to_string(),
            investment_amount,
            generated_at: Utc::now(),
            news,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn out_of_range_tolerance_is_an_error_payload() {
        let svc = NewsService::from_config(&AggregatorConfig::offline());
        for bad in [-1, 101] {
            let resp = svc.get_news_by_risk_profile(bad, "medium", 0).await;
            assert!(resp.is_error());
            let v = serde_json::to_value(&resp).unwrap();
            assert!(v["error"].as_str().unwrap().contains("0..=100"));
        }
    }

    #[tokio::test]
    async fn offline_payload_has_the_expected_shape() {
        let svc = NewsService::from_config(&AggregatorConfig::offline());
        let resp = svc.get_news_by_risk_profile(50, "medium", 100_000_000).await;
        let p = resp.payload().unwrap();
        assert_eq!(p.risk_profile, RiskProfile::Moderate);
        assert_eq!(p.total_news, p.news.len());
        assert_eq!(p.crawl_summary.sources_attempted, 12);
        assert_eq!(p.crawl_summary.live_sources, 0);

        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["policy"], "mixed");
        assert_eq!(v["risk_profile"], "Moderate");
        assert!(v["news"][0]["source_type"].is_string());
    }
}
