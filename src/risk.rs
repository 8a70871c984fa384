// src/risk.rs
//! Risk tiers and what each tier gets to read.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::ingest::types::{NewsRecord, SourceType};

pub const CONSERVATIVE_MAX: i32 = 30;
pub const MODERATE_MAX: i32 = 70;

pub const CONSERVATIVE_CAP: usize = 8;
pub const AGGRESSIVE_CAP: usize = 15;
/// Moderate mix, concatenated in this order.
pub const MODERATE_MIX: [(SourceType, usize); 3] = [
    (SourceType::Official, 4),
    (SourceType::Underground, 4),
    (SourceType::International, 2),
];
pub const TOP_SOURCES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "Conservative",
            RiskProfile::Moderate => "Moderate",
            RiskProfile::Aggressive => "Aggressive",
        }
    }

    pub fn policy(&self) -> NewsPolicy {
        match self {
            RiskProfile::Conservative => NewsPolicy::OfficialOnly,
            RiskProfile::Moderate => NewsPolicy::Mixed,
            RiskProfile::Aggressive => NewsPolicy::Comprehensive,
        }
    }

    pub fn cap(&self) -> usize {
        match self {
            RiskProfile::Conservative => CONSERVATIVE_CAP,
            RiskProfile::Moderate => MODERATE_MIX.iter().map(|(_, n)| n).sum(),
            RiskProfile::Aggressive => AGGRESSIVE_CAP,
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewsPolicy {
    OfficialOnly,
    Comprehensive,
    Mixed,
}

impl NewsPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            NewsPolicy::OfficialOnly => "official-only",
            NewsPolicy::Comprehensive => "comprehensive",
            NewsPolicy::Mixed => "mixed",
        }
    }

    pub fn source_info(&self) -> &'static str {
        match self {
            NewsPolicy::OfficialOnly => "📰 Official news from licensed outlets (CafeF, VnEconomy, DanTri)",
            NewsPolicy::Comprehensive => {
                "🔥 Everything we crawl: 7 underground forums, 3 official outlets, 2 international sites"
            }
            NewsPolicy::Mixed => "📊 Balanced mix: 4 official + 4 underground + 2 international",
        }
    }
}

/// Tolerance in `[0, 100]` to tier. Values outside the range are clamped by
/// the comparisons themselves (negative → Conservative, >100 → Aggressive);
/// range validation is the caller's job.
pub fn classify(tolerance: i32) -> RiskProfile {
    if tolerance <= CONSERVATIVE_MAX {
        RiskProfile::Conservative
    } else if tolerance <= MODERATE_MAX {
        RiskProfile::Moderate
    } else {
        RiskProfile::Aggressive
    }
}

/// Curate `records` (already newest-first) for `profile`. Input order is kept
/// within every slice.
pub fn select_news(profile: RiskProfile, records: &[NewsRecord]) -> Vec<NewsRecord> {
    match profile {
        RiskProfile::Conservative => of_type(records, SourceType::Official, CONSERVATIVE_CAP),
        RiskProfile::Aggressive => records.iter().take(AGGRESSIVE_CAP).cloned().collect(),
        RiskProfile::Moderate => MODERATE_MIX
            .iter()
            .flat_map(|(t, n)| of_type(records, *t, *n))
            .collect(),
    }
}

fn of_type(records: &[NewsRecord], t: SourceType, n: usize) -> Vec<NewsRecord> {
    records
        .iter()
        .filter(|r| r.source_type == t)
        .take(n)
        .cloned()
        .collect()
}

pub fn distinct_sources(records: &[NewsRecord]) -> usize {
    records
        .iter()
        .map(|r| r.source.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub advice: String,
    pub warning: String,
    pub focus: String,
    pub recommended_sources: Vec<String>,
    pub horizon_note: String,
}

pub fn recommendation(profile: RiskProfile, time_horizon: &str) -> Recommendation {
    let (advice, warning, focus, sources): (&str, &str, &str, &[&str]) = match profile {
        RiskProfile::Conservative => (
            "Stick to official reporting from CafeF, VnEconomy and DanTri.",
            "Avoid acting on rumours from underground forums.",
            "Fundamentals, financial statements, macro policy.",
            &["CafeF", "VnEconomy", "DanTri"],
        ),
        RiskProfile::Moderate => (
            "Balance official reporting with selected community discussion.",
            "Diversify what you read and treat forum tips with care.",
            "Combine fundamental and technical analysis, watch sentiment across channels.",
            &["CafeF", "F319", "TraderViet", "Investing.com"],
        ),
        RiskProfile::Aggressive => (
            "Use every channel, from underground forums to official and international coverage.",
            "Always cross-check a tip against several sources before trading on it.",
            "Hot threads on F319/F247, technical setups, market sentiment.",
            &["F319", "F247", "TraderViet", "StockBook", "Investing.com"],
        ),
    };

    Recommendation {
        advice: advice.to_string(),
        warning: warning.to_string(),
        focus: focus.to_string(),
        recommended_sources: sources.iter().map(|s| s.to_string()).collect(),
        horizon_note: horizon_note(time_horizon).to_string(),
    }
}

fn horizon_note(time_horizon: &str) -> &'static str {
    let h = time_horizon.to_lowercase();
    if h.contains("short") || h.contains("ngắn") {
        "Short horizon: intraday news flow and sentiment move prices the most."
    } else if h.contains("long") || h.contains("dài") {
        "Long horizon: weigh earnings and macro trends over daily headlines."
    } else {
        "Medium horizon: follow quarterly results and sector rotation."
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoverageQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl CoverageQuality {
    pub fn description(&self) -> &'static str {
        match self {
            CoverageQuality::Excellent => "Comprehensive coverage from every source type",
            CoverageQuality::Good => "Balanced coverage from multiple sources",
            CoverageQuality::Fair => "Limited but adequate coverage",
            CoverageQuality::Poor => "Insufficient coverage, verify manually",
        }
    }
}

/// Grade by number of populated source types and article count.
pub fn coverage_quality(types_populated: usize, articles: usize) -> CoverageQuality {
    if types_populated >= 3 && articles >= 20 {
        CoverageQuality::Excellent
    } else if types_populated >= 3 && articles >= 15 {
        CoverageQuality::Good
    } else if types_populated >= 2 && articles >= 10 {
        CoverageQuality::Fair
    } else {
        CoverageQuality::Poor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlSummary {
    pub total_articles: usize,
    pub sources_breakdown: BTreeMap<String, usize>,
    pub types_breakdown: BTreeMap<String, usize>,
    /// Sources that contributed at least one live record.
    pub live_sources: usize,
    /// Sources that contributed only fallback records.
    pub fallback_sources: usize,
    pub sources_attempted: usize,
    /// Live sources over attempted, percent with one decimal.
    pub success_rate: f64,
    pub top_sources: Vec<SourceCount>,
    pub coverage_quality: CoverageQuality,
    pub coverage_note: String,
}

pub fn crawl_summary(records: &[NewsRecord], sources_attempted: usize) -> CrawlSummary {
    let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
    let mut live: BTreeSet<&str> = BTreeSet::new();
    for r in records {
        *by_source.entry(r.source.clone()).or_default() += 1;
        if !r.fallback {
            live.insert(r.source.as_str());
        }
    }

    let types_breakdown: BTreeMap<String, usize> = SourceType::ALL
        .iter()
        .map(|t| {
            (
                t.as_str().to_string(),
                records.iter().filter(|r| r.source_type == *t).count(),
            )
        })
        .collect();
    let populated = types_breakdown.values().filter(|n| **n > 0).count();

    let mut top: Vec<SourceCount> = by_source
        .iter()
        .map(|(s, n)| SourceCount {
            source: s.clone(),
            count: *n,
        })
        .collect();
    // BTreeMap order gives the name tie-break
    top.sort_by(|a, b| b.count.cmp(&a.count));
    top.truncate(TOP_SOURCES);

    let success_rate = if sources_attempted == 0 {
        0.0
    } else {
        (live.len() as f64 * 1000.0 / sources_attempted as f64).round() / 10.0
    };
    let quality = coverage_quality(populated, records.len());

    CrawlSummary {
        total_articles: records.len(),
        live_sources: live.len(),
        fallback_sources: by_source.len() - live.len(),
        sources_breakdown: by_source,
        types_breakdown,
        sources_attempted,
        success_rate,
        top_sources: top,
        coverage_quality: quality,
        coverage_note: quality.description().to_string(),
    }
}
