// src/error.rs
//! Typed failures of a single source fetch.
//!
//! The split matters for breaker accounting: only reachability failures
//! (`Network`, `Timeout`, `Status`) count against a source, a page that loaded
//! but yielded nothing usable (`Parse`) does not.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not extract news from {url}: {reason}")]
    Parse { url: String, reason: String },
}

impl FetchError {
    /// True when the site itself could not be reached (counts toward the breaker).
    pub fn is_reachability(&self) -> bool {
        !matches!(self, FetchError::Parse { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network { .. } => "network",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Status { .. } => "status",
            FetchError::Parse { .. } => "parse",
        }
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_ms,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                source: err,
            }
        }
    }
}
