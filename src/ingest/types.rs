// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed taxonomy of where a record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Underground,
    Official,
    International,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [
        SourceType::Underground,
        SourceType::Official,
        SourceType::International,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Underground => "underground",
            SourceType::Official => "official",
            SourceType::International => "international",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub title: String,
    pub summary: String,
    pub link: String,
    /// Capture time, or the page's own machine-readable publish time.
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub source_type: SourceType,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    /// Simulated content served instead of a live crawl.
    #[serde(default)]
    pub fallback: bool,
}

/// Anything the orchestrator can fan out to.
///
/// Adapters are expected to absorb their own failures and always return
/// records; an `Err` (or a panic) is treated by the orchestrator as an empty
/// contribution.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;
    fn source_type(&self) -> SourceType;
    async fn fetch(&self) -> Result<Vec<NewsRecord>>;
}
