//! # Circuit Breaker
//!
//! Per-dependency failure isolation for crawled sources.
//!
//! ```text
//! Closed ──(failures >= threshold)──> Open
//!    ↑                                  │
//!    │                        (cooldown elapsed since
//!    │                          the last failure)
//!    │                                  ↓
//!    └──────(probe succeeds)──────── HalfOpen ──(probe fails)──> Open
//! ```
//!
//! HalfOpen admits exactly one probe. Every key is created lazily in the
//! Closed state and all transitions for a key happen under one lock.
//!
//! Callers that may be cancelled should go through [`CircuitBreaker::try_call`]:
//! the returned [`CallPermit`] hands an unsettled probe back when dropped.

use metrics::counter;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::BreakerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Default)]
struct Circuit {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    probe_in_flight: bool,
}

/// Read-only view of one dependency, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    /// Seconds since the last recorded failure, if any.
    pub secs_since_failure: Option<u64>,
}

/// One admitted call. Dropping it without [`CallPermit::succeeded`] or
/// [`CallPermit::failed`] returns a HalfOpen probe slot to the breaker, so a
/// cancelled or panicking caller cannot pin the circuit in HalfOpen.
#[must_use = "report the outcome or drop the permit"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    dep: String,
    probe: bool,
    settled: bool,
}

impl CallPermit<'_> {
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn succeeded(mut self) {
        self.settled = true;
        self.breaker.record_success(&self.dep);
    }

    pub fn failed(mut self) {
        self.settled = true;
        self.breaker.record_failure(&self.dep);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.probe && !self.settled {
            debug!(target: "circuit_breaker", dep = %self.dep, "probe abandoned, slot returned");
            self.breaker.release_probe(&self.dep);
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    pub fn from_config(cfg: &BreakerConfig) -> Self {
        Self::new(cfg.failure_threshold, cfg.cooldown())
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn call_allowed(&self, dep: &str) -> bool {
        self.call_allowed_at(dep, Instant::now())
    }

    /// Evaluate the Open → HalfOpen transition and decide whether `dep` may be called.
    pub fn call_allowed_at(&self, dep: &str, now: Instant) -> bool {
        self.admit(dep, now).is_some()
    }

    /// Admission as a permit; the outcome is reported through the permit.
    pub fn try_call(&self, dep: &str) -> Option<CallPermit<'_>> {
        let probe = self.admit(dep, Instant::now())?;
        Some(CallPermit {
            breaker: self,
            dep: dep.to_string(),
            probe,
            settled: false,
        })
    }

    /// `None` when rejected, otherwise whether the admission is the HalfOpen probe.
    fn admit(&self, dep: &str, now: Instant) -> Option<bool> {
        let mut circuits = self.lock();
        let c = circuits.entry(dep.to_string()).or_default();

        match c.state {
            CircuitState::Closed => Some(false),
            CircuitState::Open => {
                let cooled = c
                    .last_failure
                    .map(|t| now.saturating_duration_since(t) > self.cooldown)
                    .unwrap_or(true);
                if cooled {
                    c.state = CircuitState::HalfOpen;
                    c.probe_in_flight = true;
                    info!(target: "circuit_breaker", dep, "half-open, sending probe");
                    counter!("breaker_transitions_total", "to" => "half_open").increment(1);
                    Some(true)
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                if c.probe_in_flight {
                    None
                } else {
                    c.probe_in_flight = true;
                    Some(true)
                }
            }
        }
    }

    pub fn record_success(&self, dep: &str) {
        let mut circuits = self.lock();
        let c = circuits.entry(dep.to_string()).or_default();
        if c.state != CircuitState::Closed {
            info!(target: "circuit_breaker", dep, from = %c.state, "circuit closed");
            counter!("breaker_transitions_total", "to" => "closed").increment(1);
        }
        *c = Circuit::default();
    }

    pub fn record_failure(&self, dep: &str) {
        self.record_failure_at(dep, Instant::now());
    }

    pub fn record_failure_at(&self, dep: &str, now: Instant) {
        let mut circuits = self.lock();
        let c = circuits.entry(dep.to_string()).or_default();
        c.failure_count = c.failure_count.saturating_add(1);
        c.last_failure = Some(now);

        let trip = match c.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => c.failure_count >= self.failure_threshold,
            CircuitState::Open => false,
        };
        if trip {
            c.state = CircuitState::Open;
            c.probe_in_flight = false;
            warn!(
                target: "circuit_breaker",
                dep,
                failures = c.failure_count,
                cooldown_secs = self.cooldown.as_secs(),
                "circuit opened"
            );
            counter!("breaker_transitions_total", "to" => "open").increment(1);
        }
    }

    /// Hand back a HalfOpen probe slot that was granted but never used.
    pub fn release_probe(&self, dep: &str) {
        let mut circuits = self.lock();
        if let Some(c) = circuits.get_mut(dep) {
            if c.state == CircuitState::HalfOpen {
                c.probe_in_flight = false;
            }
        }
    }

    pub fn state(&self, dep: &str) -> CircuitState {
        self.lock()
            .get(dep)
            .map(|c| c.state)
            .unwrap_or_default()
    }

    pub fn failure_count(&self, dep: &str) -> u32 {
        self.lock().get(dep).map(|c| c.failure_count).unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<String, CircuitSnapshot> {
        let now = Instant::now();
        self.lock()
            .iter()
            .map(|(dep, c)| {
                (
                    dep.clone(),
                    CircuitSnapshot {
                        state: c.state,
                        failure_count: c.failure_count,
                        secs_since_failure: c
                            .last_failure
                            .map(|t| now.saturating_duration_since(t).as_secs()),
                    },
                )
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(5, Duration::from_secs(60))
    }

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let cb = breaker();
        let t0 = Instant::now();
        for i in 0..4 {
            cb.record_failure_at("F247", t0 + Duration::from_secs(i));
            assert!(cb.call_allowed_at("F247", t0 + Duration::from_secs(i)));
        }
        cb.record_failure_at("F247", t0 + Duration::from_secs(4));
        assert_eq!(cb.state("F247"), CircuitState::Open);
        assert!(!cb.call_allowed_at("F247", t0 + Duration::from_secs(30)));
        assert!(!cb.call_allowed_at("F247", t0 + Duration::from_secs(64)));
    }

    #[test]
    fn success_in_closed_state_resets_count() {
        let cb = breaker();
        for _ in 0..4 {
            cb.record_failure("CafeF");
        }
        cb.record_success("CafeF");
        assert_eq!(cb.failure_count("CafeF"), 0);
        for _ in 0..4 {
            cb.record_failure("CafeF");
        }
        assert_eq!(cb.state("CafeF"), CircuitState::Closed);
    }

    #[test]
    fn half_open_admits_exactly_one_probe() {
        let cb = breaker();
        let t0 = Instant::now();
        for _ in 0..5 {
            cb.record_failure_at("NDH", t0);
        }
        let later = t0 + Duration::from_secs(61);
        assert!(cb.call_allowed_at("NDH", later));
        assert_eq!(cb.state("NDH"), CircuitState::HalfOpen);
        assert!(!cb.call_allowed_at("NDH", later));
        assert!(!cb.call_allowed_at("NDH", later + Duration::from_secs(5)));
    }

    #[test]
    fn probe_success_closes_and_resets() {
        let cb = breaker();
        let t0 = Instant::now();
        for _ in 0..5 {
            cb.record_failure_at("DanTri", t0);
        }
        assert!(cb.call_allowed_at("DanTri", t0 + Duration::from_secs(61)));
        cb.record_success("DanTri");
        assert_eq!(cb.state("DanTri"), CircuitState::Closed);
        assert_eq!(cb.failure_count("DanTri"), 0);
        assert!(cb.call_allowed("DanTri"));
    }

    #[test]
    fn probe_failure_reopens_and_restarts_cooldown() {
        let cb = breaker();
        let t0 = Instant::now();
        for _ in 0..5 {
            cb.record_failure_at("VnEconomy", t0);
        }
        let probe_at = t0 + Duration::from_secs(61);
        assert!(cb.call_allowed_at("VnEconomy", probe_at));
        cb.record_failure_at("VnEconomy", probe_at);
        assert_eq!(cb.state("VnEconomy"), CircuitState::Open);
        // cooldown counts from the failed probe, not the original trip
        assert!(!cb.call_allowed_at("VnEconomy", probe_at + Duration::from_secs(30)));
        assert!(cb.call_allowed_at("VnEconomy", probe_at + Duration::from_secs(61)));
    }

    #[test]
    fn released_probe_can_be_granted_again() {
        let cb = breaker();
        let t0 = Instant::now();
        for _ in 0..5 {
            cb.record_failure_at("FireAnt", t0);
        }
        let later = t0 + Duration::from_secs(61);
        assert!(cb.call_allowed_at("FireAnt", later));
        cb.release_probe("FireAnt");
        assert!(cb.call_allowed_at("FireAnt", later));
        assert!(!cb.call_allowed_at("FireAnt", later));
    }

    #[test]
    fn dropped_probe_permit_returns_the_slot() {
        let cb = CircuitBreaker::new(1, Duration::ZERO);
        cb.record_failure("Kakata");
        std::thread::sleep(Duration::from_millis(2));

        let permit = cb.try_call("Kakata").expect("probe granted");
        assert!(permit.is_probe());
        assert!(cb.try_call("Kakata").is_none());
        drop(permit);

        assert_eq!(cb.state("Kakata"), CircuitState::HalfOpen);
        let retry = cb.try_call("Kakata").expect("slot handed back");
        retry.succeeded();
        assert_eq!(cb.state("Kakata"), CircuitState::Closed);
    }

    #[test]
    fn dropping_a_closed_state_permit_leaves_a_later_probe_alone() {
        let cb = CircuitBreaker::new(1, Duration::ZERO);
        let stale = cb.try_call("OnStocks").expect("closed admits");
        assert!(!stale.is_probe());

        cb.record_failure("OnStocks");
        std::thread::sleep(Duration::from_millis(2));
        let probe = cb.try_call("OnStocks").expect("probe granted");
        drop(stale);
        // the probe is still out
        assert!(cb.try_call("OnStocks").is_none());
        probe.failed();
        assert_eq!(cb.state("OnStocks"), CircuitState::Open);
    }

    #[test]
    fn unknown_dependency_starts_closed() {
        let cb = breaker();
        assert_eq!(cb.state("never-seen"), CircuitState::Closed);
        assert!(cb.call_allowed("never-seen"));
        assert!(cb.snapshot().contains_key("never-seen"));
    }
}
