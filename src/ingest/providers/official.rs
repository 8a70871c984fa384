// src/ingest/providers/official.rs
//! Licensed news outlets.

use crate::ingest::descriptor::SourceDescriptor;
use crate::ingest::types::SourceType::Official;

pub fn descriptors() -> Vec<SourceDescriptor> {
    vec![cafef(), vneconomy(), dantri()]
}

fn cafef() -> SourceDescriptor {
    SourceDescriptor::new("CafeF", Official, "https://cafef.vn/thi-truong-chung-khoan.chn")
        .selectors(&["h3.title a", ".tlitem h3 a", ".box-category-item h3 a", "h3 a"])
        .prefix("📰 CafeF: ")
        .summary("Tin chính thống từ CafeF về {title}...")
        .caps(5, 3)
        .timeout_secs(10)
        .fallback(
            "📰 CafeF: VN-Index giữ vững vùng 1.250 điểm, thanh khoản cải thiện",
            "Thị trường đi ngang trong biên độ hẹp, dòng tiền tập trung vào nhóm ngân hàng và thép.",
            "https://cafef.vn/thi-truong-chung-khoan.chn",
        )
        .fallback(
            "📰 CafeF: Khối ngoại quay lại mua ròng sau chuỗi bán ròng",
            "Giao dịch khối ngoại tích cực trở lại với giá trị mua ròng tập trung ở VCB, FPT, HPG.",
            "https://cafef.vn/thi-truong-chung-khoan.chn",
        )
}

fn vneconomy() -> SourceDescriptor {
    SourceDescriptor::new("VnEconomy", Official, "https://vneconomy.vn/chung-khoan.htm")
        .selectors(&["h3.story__title a", ".story__title a", "h3 a", "h2 a"])
        .prefix("📰 VnEconomy: ")
        .summary("Phân tích từ VnEconomy: {title}...")
        .timeout_secs(10)
        .fallback(
            "📰 VnEconomy: Lãi suất ổn định hỗ trợ thị trường chứng khoán",
            "Mặt bằng lãi suất duy trì thấp tạo điều kiện cho dòng vốn quay lại kênh cổ phiếu.",
            "https://vneconomy.vn/chung-khoan.htm",
        )
        .fallback(
            "📰 VnEconomy: Kết quả kinh doanh quý III của doanh nghiệp niêm yết",
            "Lợi nhuận sau thuế toàn thị trường tăng so với cùng kỳ, nhóm bán lẻ và công nghệ dẫn đầu.",
            "https://vneconomy.vn/chung-khoan.htm",
        )
}

fn dantri() -> SourceDescriptor {
    SourceDescriptor::new("DanTri", Official, "https://dantri.com.vn/kinh-doanh/chung-khoan.htm")
        .selectors(&[".article-title", ".news-title", "h3 a", "h2 a", ".title a"])
        .prefix("📰 DanTri: ")
        .summary("Tin tức chính thống từ DanTri - {title}...")
        .fallback(
            "📰 DanTri: Thị trường chứng khoán kỳ vọng nâng hạng",
            "Các bước chuẩn bị cho lộ trình nâng hạng thị trường đang được đẩy nhanh...",
            "https://dantri.com.vn/kinh-doanh/chung-khoan.htm",
        )
}
