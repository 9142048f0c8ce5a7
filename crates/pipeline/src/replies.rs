//! User-facing reply and failure strings.
//!
//! Everything a user can see is a short, friendly Vietnamese string,
//! never a raw error. Remote-failure messages may carry the underlying
//! error text for diagnostics (see the search and llm crates).

/// Reply for greeting-intent queries.
pub const GREETING_REPLY: &str =
    "🥰 Chào bạn nha! Mình luôn sẵn sàng hỗ trợ nếu bạn cần tìm hiểu về du lịch Bình Định nè!";

/// Reply for queries outside the travel domain.
pub const UNRELATED_REPLY: &str = "😥 Xin lỗi, câu hỏi của bạn nằm ngoài lĩnh vực du lịch, văn hóa, lịch sử Bình Định. Bạn thử hỏi mình những câu liên quan đến vùng đất này nha!";

/// Search returned zero hits.
pub const NO_RESULTS: &str = "Mình không hiểu câu này lắm 😥. Bạn thử hỏi ngắn gọn hơn ^^";

/// All hits were removed by deduplication.
pub const NO_RESULTS_AFTER_DEDUP: &str = "Không tìm thấy kết quả nào chứa từ khóa.";

/// No document fit the context token budget.
pub const NO_CONTENT_IN_BUDGET: &str = "Không tìm thấy nội dung phù hợp trong giới hạn token.";

/// The generation deadline elapsed.
pub const TOO_SLOW: &str = "Mình xử lý hơi lâu, bạn hỏi lại nhé!";

/// The invocation was cancelled.
pub const STOPPED: &str = "Tác vụ trả lời đã bị dừng.";

/// Empty query guard at the boundary layer.
pub const EMPTY_QUERY: &str = "Vui lòng nhập câu hỏi!";

/// Trailing citation anchor for the first source document.
pub fn citation(link: &str) -> String {
    format!("\n\n<a href=\"{}\">Đọc thêm tại đây nhé😊</a>", link)
}
