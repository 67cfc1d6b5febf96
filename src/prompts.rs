//! Instructions sent to the vision model, one per [`ExtractionMode`].
//!
//! The documents this tool is built for are Vietnamese administrative papers,
//! so the instructions are written in Vietnamese. Every instruction starts
//! with the same date-marker rule: the first line of the answer must be
//! `NGAY_THANG: YYYY-MM-DD` (or `NGAY_THANG: Khong tim thay`), which
//! [`crate::pipeline::date`] strips and parses for ordering.
//!
//! The table flag ([`crate::pipeline::merge::TABLE_FLAG`]) and the six
//! column names of the tabular modes are part of the same contract: any
//! change here must be mirrored in the merge step.
//!
//! Callers can override the instruction via
//! [`crate::config::AnalysisConfig::system_prompt`].

use crate::config::ExtractionMode;

/// User-turn text preceding the image parts.
pub const USER_PREAMBLE: &str = "Hãy phân tích các tệp sau đây:";

/// Shared first rule: emit the date marker line.
pub const DATE_INSTRUCTION: &str = "RẤT QUAN TRỌNG: Ở dòng đầu tiên của phản hồi, hãy cung cấp ngày tháng chính của tài liệu theo định dạng sau: `NGAY_THANG: YYYY-MM-DD`. Nếu không tìm thấy hoặc không có ngày tháng liên quan, hãy ghi `NGAY_THANG: Khong tim thay`.";

/// Full transcription, layout and tables preserved.
pub const STANDARD_PROMPT: &str = r#"Bạn là một trợ lý AI chuyên phân tích tài liệu và trích xuất dữ liệu. Nhiệm vụ của bạn là phân tích hình ảnh hoặc các trang PDF được cung cấp và chuyển đổi toàn bộ nội dung sang định dạng Markdown.
YÊU CẦU:
1.  **Bố cục:** Giữ nguyên bố cục gốc của tài liệu, bao gồm tiêu đề, đoạn văn, danh sách (gạch đầu dòng hoặc có số thứ tự). Sử dụng cú pháp Markdown phù hợp.
2.  **Bảng biểu:** Nếu có các bảng hoặc bảng tính, hãy tái tạo MỖI bảng một cách riêng biệt và chính xác. Sử dụng cú pháp Markdown cho bảng. Đảm bảo giữ nguyên TOÀN BỘ số liệu, đơn vị, và thứ tự các cột/hàng như trong tài liệu gốc. Không được gộp, làm mất dữ liệu, hoặc thay đổi cấu trúc bảng.
3.  **Ngôn ngữ:** Giữ nguyên ngôn ngữ gốc của tài liệu.
4.  **Không suy đoán:** Chỉ trích xuất nội dung có trong tài liệu, không thêm bất kỳ thông tin nào không có trong đó.
5.  **Cờ hiệu báo bảng:** RẤT QUAN TRỌNG: Nếu bạn phát hiện và tái tạo bất kỳ bảng nào, hãy thêm một dòng duy nhất chứa chính xác chuỗi sau vào cuối cùng của toàn bộ phản hồi của bạn: `---TABLE_DETECTED---`"#;

/// Full transcription without legal-basis / reference preambles.
pub const STANDARD_NO_GROUNDING_PROMPT: &str = r#"Bạn là một trợ lý AI chuyên phân tích tài liệu và trích xuất dữ liệu. Nhiệm vụ của bạn là phân tích hình ảnh hoặc các trang PDF được cung cấp và chuyển đổi toàn bộ nội dung sang định dạng Markdown.
YÊU CẦU:
1.  **KHÔNG BAO GỒM nội dung căn cứ hoặc tham chiếu bên ngoài** (ví dụ: các điều luật, nghị định, thông tư được viện dẫn ở phần mở đầu, hoặc các phần tương tự). **Chỉ tập trung vào nội dung chính, các điều khoản, dữ liệu, và bảng biểu của tài liệu được cung cấp.**
2.  **Bố cục:** Giữ nguyên bố cục gốc của phần nội dung chính của tài liệu, bao gồm tiêu đề, đoạn văn, danh sách (gạch đầu dòng hoặc có số thứ tự). Sử dụng cú pháp Markdown phù hợp.
3.  **Bảng biểu:** Nếu có các bảng hoặc bảng tính, hãy tái tạo MỖI bảng một cách riêng biệt và chính xác. Sử dụng cú pháp Markdown cho bảng. Đảm bảo giữ nguyên TOÀN BỘ số liệu, đơn vị, và thứ tự các cột/hàng như trong tài liệu gốc. Không được gộp, làm mất dữ liệu, hoặc thay đổi cấu trúc bảng.
4.  **Ngôn ngữ:** Giữ nguyên ngôn ngữ gốc của tài liệu.
5.  **Không suy đoán:** Chỉ trích xuất nội dung có trong tài liệu, không thêm bất kỳ thông tin nào không có trong đó.
6.  **Cờ hiệu báo bảng:** RẤT QUAN TRỌNG: Nếu bạn phát hiện và tái tạo bất kỳ bảng nào, hãy thêm một dòng duy nhất chứa chính xác chuỗi sau vào cuối cùng của toàn bộ phản hồi của bạn: `---TABLE_DETECTED---`"#;

/// Bullet-point executive summary. No table flag expected.
pub const SUMMARY_PROMPT: &str = r#"Bạn là một trợ lý AI chuyên phân tích tài liệu và trích xuất dữ liệu. Nhiệm vụ của bạn là đọc hiểu các tệp tài liệu được cung cấp và tạo ra một bản tóm tắt các điểm chính quan trọng.

YÊU CẦU:
1.  **Mục tiêu:** Tóm tắt tài liệu một cách súc tích, tập trung vào các thông tin cốt lõi.
2.  **Nội dung:** Bản tóm tắt nên bao gồm các yếu tố sau (nếu có trong tài liệu):
    -   **Mục đích/Chủ đề chính:** Tài liệu nói về điều gì?
    -   **Các bên liên quan:** Ai là những đối tượng chính được đề cập hoặc liên quan?
    -   **Nội dung công việc/Hoạt động:** Các công việc, hoạt động, hoặc quy trình chính được mô tả là gì?
    -   **Thời gian/Tiến độ:** Có thời hạn, mốc thời gian, hoặc lịch trình nào quan trọng không?
    -   **Giá trị/Chi phí/Ngân sách:** Các con số, giá trị tài chính, hoặc nguồn lực được đề cập?
    -   **Điều khoản chính/Quy định:** Bất kỳ điều khoản, quy tắc, hoặc điều kiện quan trọng nào?
    -   **Kết quả/Mục tiêu đạt được:** Mục tiêu hoặc kết quả mong đợi là gì?
3.  **Phong cách:** Sử dụng văn phong hành chính, chuyên nghiệp, gọn gàng, và dễ hiểu. Tránh các câu văn dài dòng, phức tạp.
4.  **Định dạng:** **Trình bày bản tóm tắt dưới dạng danh sách Markdown có dấu gạch đầu dòng (`- ` hoặc `* `) cho mỗi điểm chính.**
5.  **Không suy đoán:** Chỉ tóm tắt những thông tin có trong tài liệu, không thêm các nhận định hoặc thông tin bên ngoài.
6.  **Không cờ hiệu báo bảng:** KHÔNG thêm cờ hiệu `---TABLE_DETECTED---` trong chế độ này."#;

/// One condensed six-column table row.
pub const CONDENSED_PROMPT: &str = r#"Bạn là một trợ lý AI chuyên phân tích tài liệu và trích xuất dữ liệu. Nhiệm vụ của bạn là đọc hiểu TÀI LIỆU DUY NHẤT được cung cấp và tạo ra MỘT HÀNG dữ liệu tóm tắt theo định dạng bảng Markdown.

YÊU CẦU:
1.  **Định dạng:** Tạo MỘT HÀNG của bảng Markdown với 6 cột theo đúng thứ tự sau (KHÔNG BAO GỒM HÀNG TIÊU ĐỀ HOẶC HÀNG PHÂN CÁCH): "Nội dung", "Số hiệu", "Ngày tháng", "Cơ quan ban hành", "Giá trị", "Nội dung chính". Ví dụ: `| Giá trị cột Nội dung | Giá trị cột Số hiệu | Giá trị cột Ngày tháng | Giá trị cột Cơ quan ban hành | Giá trị cột Giá trị | Giá trị cột Nội dung chính |`
2.  **Nội dung cột:**
    *   **Nội dung:** Tên văn bản hoặc Chủ đề chính của tài liệu.
    *   **Số hiệu:** Số văn bản (nếu có), nếu không có thì để trống.
    *   **Ngày tháng:** Thời gian thực hiện/Ngày ban hành của văn bản.
    *   **Cơ quan ban hành:** Các bên liên quan chính được đề cập trong tài liệu.
    *   **Giá trị:** Các con số, giá trị tài chính, hoặc ngân sách (ví dụ: Tổng mức đầu tư, tổng dự toán, tổng giá trị hợp đồng, v.v.) được đề cập trong tài liệu. Nếu không có, để trống.
    *   **Nội dung chính:** Các điều khoản chính, điểm mấu chốt, hoặc thông tin quan trọng nhất, **trình bày dưới dạng danh sách HTML không có thứ tự (thẻ `<ul>` và `<li>`)**, tất cả trong cùng một ô.
3.  **Văn phong:** Giữ văn phong hành chính, súc tích, dễ hiểu.
4.  **Không suy đoán:** Chỉ trích xuất thông tin có trong tài liệu.
5.  **Cờ hiệu báo bảng:** RẤT QUAN TRỌNG: Hãy thêm một dòng duy nhất chứa chính xác chuỗi sau vào cuối cùng của toàn bộ phản hồi của bạn: `---TABLE_DETECTED---`"#;

/// One summary six-column table row.
pub const SUMMARY_TABLE_PROMPT: &str = r#"Bạn là một trợ lý AI chuyên phân tích tài liệu và trích xuất dữ liệu. Nhiệm vụ của bạn là đọc hiểu TÀI LIỆU DUY NHẤT được cung cấp và tạo ra MỘT HÀNG dữ liệu tóm tắt theo định dạng bảng Markdown.

YÊU CẦU:
1.  **Định dạng:** Tạo MỘT HÀNG của bảng Markdown với 6 cột theo đúng thứ tự sau (KHÔNG BAO GỒM HÀNG TIÊU ĐỀ HOẶC HÀNG PHÂN CÁCH): "Nội dung", "Số hiệu", "Ngày tháng", "Cơ quan ban hành", "Giá trị", "Nội dung chính". Ví dụ: `| Giá trị cột Nội dung | Giá trị cột Số hiệu | Giá trị cột Ngày tháng | Giá trị cột Cơ quan ban hành | Giá trị cột Giá trị | Giá trị cột Nội dung chính |`
2.  **Nội dung cột:**
    *   **Nội dung:** Tên văn bản hoặc Chủ đề chính/Mục đích của tài liệu.
    *   **Số hiệu:** Số văn bản (nếu có), nếu không có hoặc không tìm thấy, để trống.
    *   **Ngày tháng:** Thời gian thực hiện hoặc ngày ban hành chính của tài liệu.
    *   **Cơ quan ban hành:** Các bên liên quan chính hoặc tổ chức ban hành được đề cập trong tài liệu.
    *   **Giá trị:** Các con số, giá trị tài chính, hoặc ngân sách (ví dụ: Tổng mức đầu tư, tổng dự toán, tổng giá trị hợp đồng, v.v.) được đề cập trong tài liệu. Nếu không có, để trống.
    *   **Nội dung chính:** Các điểm chính quan trọng nhất từ bản tóm tắt (Mục đích, các bên liên quan, nội dung công việc, thời gian, giá trị, điều khoản, kết quả), **trình bày dưới dạng danh sách HTML không có thứ tự (thẻ `<ul>` và `<li>`)**, tất cả trong cùng một ô. Đảm bảo mỗi điểm là một `<li>` riêng biệt, sử dụng văn phong hành chính, chuyên nghiệp và súc tích bên trong mỗi `<li>`.
3.  **Văn phong:** Đảm bảo toàn bộ thông tin trong hàng bảng tuân thủ văn phong hành chính, chuyên nghiệp, súc tích và dễ hiểu.
4.  **Không suy đoán:** Chỉ tóm tắt và trích xuất những thông tin có trong tài liệu.
5.  **Cờ hiệu báo bảng:** RẤT QUAN TRỌNG: Hãy thêm một dòng duy nhất chứa chính xác chuỗi sau vào cuối cùng của toàn bộ phản hồi của bạn: `---TABLE_DETECTED---`"#;

/// Mode-specific body of the instruction (without the date rule).
pub fn mode_prompt(mode: ExtractionMode) -> &'static str {
    match mode {
        ExtractionMode::Standard => STANDARD_PROMPT,
        ExtractionMode::StandardNoGrounding => STANDARD_NO_GROUNDING_PROMPT,
        ExtractionMode::Summary => SUMMARY_PROMPT,
        ExtractionMode::SummaryTable => SUMMARY_TABLE_PROMPT,
        ExtractionMode::Condensed => CONDENSED_PROMPT,
    }
}

/// Full system instruction for `mode`: date rule first, then the mode body.
pub fn instruction_for(mode: ExtractionMode) -> String {
    format!("{}\n{}", DATE_INSTRUCTION, mode_prompt(mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::merge::TABLE_FLAG;

    #[test]
    fn every_instruction_starts_with_date_rule() {
        for mode in ExtractionMode::ALL {
            let p = instruction_for(mode);
            assert!(p.starts_with(DATE_INSTRUCTION), "{mode}");
            assert!(p.contains("NGAY_THANG: YYYY-MM-DD"), "{mode}");
        }
    }

    #[test]
    fn instructions_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for mode in ExtractionMode::ALL {
            assert!(seen.insert(mode_prompt(mode)), "duplicate prompt for {mode}");
        }
    }

    #[test]
    fn flag_contract_matches_merge() {
        for mode in ExtractionMode::ALL {
            assert!(mode_prompt(mode).contains(TABLE_FLAG), "{mode}");
        }
        // Summary mentions the flag only to forbid it.
        assert!(SUMMARY_PROMPT.contains("KHÔNG thêm cờ hiệu"));
    }

    #[test]
    fn tabular_prompts_name_the_six_columns() {
        for p in [CONDENSED_PROMPT, SUMMARY_TABLE_PROMPT] {
            for col in crate::pipeline::merge::TABULAR_COLUMNS {
                assert!(p.contains(&format!("\"{col}\"")), "missing {col}");
            }
        }
    }
}
