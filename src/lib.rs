// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregator;
pub mod api;
pub mod circuit_breaker;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod ingest;
pub mod metrics;
pub mod monitor;
pub mod rate_limit;
pub mod risk;
pub mod service;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::config::AggregatorConfig;
pub use crate::context::ResilienceContext;
pub use crate::ingest::types::{NewsRecord, NewsSource, SourceType};
pub use crate::risk::RiskProfile;
pub use crate::service::{NewsResponse, NewsService, RiskNewsPayload};

/// One-shot convenience wrapper around a fresh [`NewsService`].
///
/// Builds its own context from `cfg`, so breaker and limiter state does not
/// survive between calls; long-running callers should keep a `NewsService`.
pub async fn get_news_by_risk_profile(
    cfg: &AggregatorConfig,
    tolerance: i32,
    time_horizon: &str,
    investment_amount: i64,
) -> NewsResponse {
    NewsService::from_config(cfg)
        .get_news_by_risk_profile(tolerance, time_horizon, investment_amount)
        .await
}
