// src/ingest/providers/international.rs
//! Foreign coverage of the Vietnamese market.

use crate::ingest::descriptor::SourceDescriptor;
use crate::ingest::types::SourceType::International;

pub fn descriptors() -> Vec<SourceDescriptor> {
    vec![investing(), yahoo()]
}

fn investing() -> SourceDescriptor {
    SourceDescriptor::new(
        "Investing.com",
        International,
        "https://www.investing.com/indices/vn-commentary",
    )
    .selectors(&[".articleItem", ".js-article-item", ".largeTitle a", "h3 a", ".title a"])
    .prefix("🌍 Investing.com: ")
    .summary("Phân tích quốc tế về thị trường Việt Nam - {title}...")
    .caps(4, 2)
    .fallback(
        "🌍 Investing.com: Vietnam market outlook - Positive sentiment ahead",
        "International analysis shows a positive outlook for the Vietnam market on strong fundamentals...",
        "https://www.investing.com/indices/vn-commentary",
    )
}

fn yahoo() -> SourceDescriptor {
    SourceDescriptor::new(
        "Yahoo Finance",
        International,
        "https://finance.yahoo.com/quote/VNM/community",
    )
    .selectors(&[
        ".comment-title",
        ".post-title",
        "[data-test-locator=\"StreamPostTitle\"]",
        "h3",
        ".title",
    ])
    .prefix("💰 Yahoo Finance: ")
    .summary("Thảo luận cộng đồng quốc tế về VNM - {title}...")
    .caps(4, 2)
    .fallback(
        "💰 Yahoo Finance: VNM discussion - Strong dividend yield attracts investors",
        "International community discussing the VNM dividend policy and growth prospects...",
        "https://finance.yahoo.com/quote/VNM/community",
    )
}
