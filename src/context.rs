// src/context.rs
//! Shared resilience state handed to every adapter.
//!
//! One context per service instance; tests build their own so breaker and
//! limiter state never leaks between them.

use std::sync::Arc;
use std::time::Duration;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::AggregatorConfig;
use crate::http::HttpPool;
use crate::monitor::PerformanceMonitor;
use crate::rate_limit::RateLimiter;

#[derive(Debug)]
pub struct ResilienceContext {
    pub http: HttpPool,
    pub breaker: CircuitBreaker,
    pub limiter: RateLimiter,
    pub monitor: PerformanceMonitor,
    rate_wait: Duration,
    offline: bool,
}

impl ResilienceContext {
    pub fn new(cfg: &AggregatorConfig) -> Self {
        Self {
            http: HttpPool::new(cfg.http.clone()),
            breaker: CircuitBreaker::from_config(&cfg.breaker),
            limiter: RateLimiter::from_config(&cfg.rate_limit),
            monitor: PerformanceMonitor::from_config(&cfg.monitor),
            rate_wait: cfg.rate_limit.max_wait(),
            offline: cfg.crawl.offline,
        }
    }

    pub fn shared(cfg: &AggregatorConfig) -> Arc<Self> {
        Arc::new(Self::new(cfg))
    }

    /// Longest an adapter waits for a rate-limit slot before serving fallback.
    pub fn rate_wait(&self) -> Duration {
        self.rate_wait
    }

    /// When set, adapters never touch the network.
    pub fn offline(&self) -> bool {
        self.offline
    }
}
