//! # Rate Limiter
//! Sliding-window call-frequency guard keyed by logical operation.
//!
//! Each key owns a deque of admission instants. Admitting a call evicts
//! everything older than `now - window` and records `now` when fewer than
//! `max_calls` remain. Denied callers are expected to wait, not give up:
//! [`RateLimiter::acquire`] sleeps for [`RateLimiter::wait_time`] and retries.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::config::RateLimitConfig;

/// Thread-safe sliding-window limiter.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    max_calls: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_calls: max_calls.max(1),
            window,
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(cfg.max_calls, cfg.window())
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now())
    }

    /// Admit-or-deny at an explicit instant.
    pub fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let calls = windows.entry(key.to_string()).or_default();
        evict(calls, now, self.window);

        if calls.len() < self.max_calls {
            calls.push_back(now);
            true
        } else {
            false
        }
    }

    pub fn wait_time(&self, key: &str) -> Duration {
        self.wait_time_at(key, Instant::now())
    }

    /// Time until the oldest recorded call leaves the window (zero if none).
    pub fn wait_time_at(&self, key: &str, now: Instant) -> Duration {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        match windows.get(key).and_then(|calls| calls.front()) {
            Some(&oldest) => self.window.saturating_sub(now.saturating_duration_since(oldest)),
            None => Duration::ZERO,
        }
    }

    /// Calls currently counted against `key`.
    pub fn in_window(&self, key: &str) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        match windows.get_mut(key) {
            Some(calls) => {
                evict(calls, now, self.window);
                calls.len()
            }
            None => 0,
        }
    }

    /// Throttle: suspend until admitted, giving up once the accumulated wait
    /// would exceed `max_wait`. Returns whether the call was admitted.
    pub async fn acquire(&self, key: &str, max_wait: Duration) -> bool {
        let mut waited = Duration::ZERO;
        loop {
            if self.is_allowed(key) {
                return true;
            }
            // +1ms so we land just after the oldest slot expires.
            let wait = self.wait_time(key) + Duration::from_millis(1);
            if waited + wait > max_wait {
                tracing::debug!(target: "rate_limit", key, waited_ms = waited.as_millis() as u64, "slot not available in time");
                return false;
            }
            tracing::debug!(target: "rate_limit", key, wait_ms = wait.as_millis() as u64, "throttling");
            tokio::time::sleep(wait).await;
            waited += wait;
        }
    }
}

fn evict(calls: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&t) = calls.front() {
        if now.saturating_duration_since(t) >= window {
            calls.pop_front();
        } else {
            break;
        }
    }
}
