// src/config.rs
//! Runtime configuration for the aggregator.
//!
//! Lookup order:
//! 1) `$AGGREGATOR_CONFIG_PATH` (must point to an existing file)
//! 2) `config/aggregator.toml`
//! 3) built-in defaults
//!
//! `AGGREGATOR_OFFLINE=1` forces fallback-only crawling regardless of the file.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/aggregator.toml";
pub const ENV_CONFIG_PATH: &str = "AGGREGATOR_CONFIG_PATH";
pub const ENV_OFFLINE: &str = "AGGREGATOR_OFFLINE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub http: HttpConfig,
    pub breaker: BreakerConfig,
    pub rate_limit: RateLimitConfig,
    pub crawl: CrawlConfig,
    pub monitor: MonitorConfig,
}

/// Connection pool settings for the shared client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Concurrent requests across all hosts.
    pub max_connections: usize,
    /// Concurrent requests against one host.
    pub max_connections_per_host: usize,
    /// How long an idle pooled connection is kept alive.
    pub keep_alive_secs: u64,
    pub connect_timeout_secs: u64,
    /// Upper bound for a whole request; adapters usually pass a tighter one.
    pub total_timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_connections: 100,
            max_connections_per_host: 30,
            keep_alive_secs: 30,
            connect_timeout_secs: 10,
            total_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string(),
            accept_language: "vi-VN,vi;q=0.9,en;q=0.8".to_string(),
        }
    }
}

impl HttpConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_secs(self.total_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_secs: 60,
        }
    }
}

impl BreakerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_calls: usize,
    pub window_secs: u64,
    /// How long an adapter may wait for a slot before serving its fallback.
    /// Zero means deny immediately.
    pub max_wait_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 60,
            window_secs: 60,
            max_wait_ms: 1_500,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Size of the merged, sorted result set handed to the risk filter.
    pub max_results: usize,
    /// Serve fallback content only, never touch the network.
    pub offline: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_results: 20,
            offline: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub capacity: usize,
    pub window_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            window_secs: 3600,
        }
    }
}

impl MonitorConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl AggregatorConfig {
    /// Load from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading aggregator config from {}", path.display()))?;
        let cfg: AggregatorConfig = toml::from_str(&content)
            .with_context(|| format!("parsing aggregator config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Env path, then `config/aggregator.toml`, then defaults; offline env applied last.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default()
            }
        };

        if parse_flag_env(std::env::var(ENV_OFFLINE).ok()) {
            cfg.crawl.offline = true;
        }
        Ok(cfg)
    }

    /// Defaults with network access disabled.
    pub fn offline() -> Self {
        let mut cfg = Self::default();
        cfg.crawl.offline = true;
        cfg
    }

    fn validate(&self) -> Result<()> {
        if self.http.max_connections == 0 || self.http.max_connections_per_host == 0 {
            return Err(anyhow!("http connection caps must be positive"));
        }
        if self.rate_limit.max_calls == 0 {
            return Err(anyhow!("rate_limit.max_calls must be positive"));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(anyhow!("breaker.failure_threshold must be positive"));
        }
        if self.monitor.capacity == 0 {
            return Err(anyhow!("monitor.capacity must be positive"));
        }
        Ok(())
    }
}

fn parse_flag_env(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults_for_missing_sections() {
        let cfg: AggregatorConfig = toml::from_str(
            r#"
[breaker]
failure_threshold = 3

[crawl]
offline = true
"#,
        )
        .unwrap();
        assert_eq!(cfg.breaker.failure_threshold, 3);
        assert_eq!(cfg.breaker.cooldown_secs, 60);
        assert!(cfg.crawl.offline);
        assert_eq!(cfg.crawl.max_results, 20);
        assert_eq!(cfg.monitor.capacity, 1000);
        assert_eq!(cfg.http.max_connections_per_host, 30);
    }

    #[test]
    fn flag_env_parsing() {
        assert!(parse_flag_env(Some("1".into())));
        assert!(parse_flag_env(Some(" TRUE ".into())));
        assert!(!parse_flag_env(Some("0".into())));
        assert!(!parse_flag_env(None));
    }

    #[test]
    fn zero_caps_are_rejected() {
        let mut cfg = AggregatorConfig::default();
        cfg.rate_limit.max_calls = 0;
        assert!(cfg.validate().is_err());
    }
}
