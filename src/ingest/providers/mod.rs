// src/ingest/providers/mod.rs
//! The crawled sites, as data.
//!
//! Every site is a [`SourceDescriptor`]; the generic adapter does the work.

pub mod international;
pub mod official;
pub mod underground;

use std::sync::Arc;

use crate::context::ResilienceContext;
use crate::ingest::adapter::SourceAdapter;
use crate::ingest::descriptor::SourceDescriptor;
use crate::ingest::types::NewsSource;

/// All sites in crawl order: underground, official, international.
pub fn catalog() -> Vec<SourceDescriptor> {
    let mut all = underground::descriptors();
    all.extend(official::descriptors());
    all.extend(international::descriptors());
    all
}

/// One adapter per catalog entry, sharing `ctx`.
pub fn default_sources(ctx: Arc<ResilienceContext>) -> Vec<Arc<dyn NewsSource>> {
    catalog()
        .into_iter()
        .map(|d| Arc::new(SourceAdapter::new(d, ctx.clone())) as Arc<dyn NewsSource>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceType;
    use std::collections::HashSet;

    #[test]
    fn twelve_sites_with_unique_names() {
        let cat = catalog();
        assert_eq!(cat.len(), 12);
        let names: HashSet<_> = cat.iter().map(|d| d.name.clone()).collect();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn every_site_is_crawlable_and_has_fallback() {
        for d in catalog() {
            assert!(!d.urls.is_empty(), "{} has no url", d.name);
            assert!(!d.selectors.is_empty(), "{} has no selectors", d.name);
            assert!(!d.fallback.is_empty(), "{} has no fallback", d.name);
            for u in &d.urls {
                assert!(url::Url::parse(u).is_ok(), "{} bad url {u}", d.name);
            }
        }
    }

    #[test]
    fn fallback_volume_covers_the_moderate_mix_and_fits_top_twenty() {
        let cat = catalog();
        let count = |t: SourceType| -> usize {
            cat.iter()
                .filter(|d| d.source_type == t)
                .map(|d| d.fallback.len())
                .sum()
        };
        assert!(count(SourceType::Official) >= 4);
        assert!(count(SourceType::Underground) >= 4);
        assert!(count(SourceType::International) >= 2);
        let total: usize = cat.iter().map(|d| d.fallback.len()).sum();
        assert!(total <= 20, "fallback total {total} would be truncated");
    }
}
