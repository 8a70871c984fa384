//! # Performance Monitor
//! Per-endpoint latency/success samples in a capped ring, summarized over a
//! trailing window (default 1h). Diagnostic only: nothing in the crawl path
//! reads these numbers back.

use metrics::{counter, histogram};
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::config::MonitorConfig;

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    duration: Duration,
    success: bool,
}

/// Summary over the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndpointStats {
    pub total_calls: usize,
    pub avg_duration_ms: f64,
    /// Percentage in `[0, 100]`.
    pub success_rate: f64,
}

impl EndpointStats {
    fn empty() -> Self {
        Self {
            total_calls: 0,
            avg_duration_ms: 0.0,
            success_rate: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct PerformanceMonitor {
    samples: Mutex<HashMap<String, VecDeque<Sample>>>,
    capacity: usize,
    window: Duration,
}

impl PerformanceMonitor {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            samples: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            window,
        }
    }

    pub fn from_config(cfg: &MonitorConfig) -> Self {
        Self::new(cfg.capacity, cfg.window())
    }

    pub fn record_call(&self, endpoint: &str, duration: Duration, success: bool) {
        self.record_call_at(endpoint, duration, success, Instant::now());
    }

    pub fn record_call_at(&self, endpoint: &str, duration: Duration, success: bool, at: Instant) {
        let outcome = if success { "ok" } else { "error" };
        histogram!("source_fetch_ms", "source" => endpoint.to_string())
            .record(duration.as_secs_f64() * 1_000.0);
        counter!("source_fetch_total", "source" => endpoint.to_string(), "outcome" => outcome)
            .increment(1);

        let mut samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        let ring = samples.entry(endpoint.to_string()).or_default();
        ring.push_back(Sample {
            at,
            duration,
            success,
        });
        while ring.len() > self.capacity {
            ring.pop_front();
        }
    }

    pub fn stats(&self, endpoint: &str) -> EndpointStats {
        self.stats_at(endpoint, Instant::now())
    }

    pub fn stats_at(&self, endpoint: &str, now: Instant) -> EndpointStats {
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        match samples.get(endpoint) {
            Some(ring) => summarize(ring, now, self.window),
            None => EndpointStats::empty(),
        }
    }

    /// Number of samples retained for `endpoint` (window not applied).
    pub fn retained(&self, endpoint: &str) -> usize {
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        samples.get(endpoint).map(VecDeque::len).unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<String, EndpointStats> {
        let now = Instant::now();
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        samples
            .iter()
            .map(|(k, ring)| (k.clone(), summarize(ring, now, self.window)))
            .collect()
    }
}

fn summarize(ring: &VecDeque<Sample>, now: Instant, window: Duration) -> EndpointStats {
    let mut n = 0usize;
    let mut total = Duration::ZERO;
    let mut ok = 0usize;

    // newest at the back; stop at the first sample outside the window
    for s in ring.iter().rev() {
        if now.saturating_duration_since(s.at) >= window {
            break;
        }
        n += 1;
        total += s.duration;
        if s.success {
            ok += 1;
        }
    }

    if n == 0 {
        return EndpointStats::empty();
    }
    let avg_ms = total.as_secs_f64() * 1_000.0 / n as f64;
    EndpointStats {
        total_calls: n,
        avg_duration_ms: round_to(avg_ms, 3),
        success_rate: round_to(ok as f64 * 100.0 / n as f64, 1),
    }
}

fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}
