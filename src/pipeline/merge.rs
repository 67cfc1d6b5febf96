//! Mode-specific merge: order per-file results by document date and
//! assemble them into one Markdown document.
//!
//! ## Ordering
//!
//! Files are stably sorted by date, ascending. Undated files (no marker,
//! unparsable marker, or a failed analysis) go after every dated file and
//! keep their submitted order; equal dates keep submitted order too.
//!
//! ## Narrative modes (`Standard`, `StandardNoGrounding`, `Summary`)
//!
//! One section per file: a highlighted header naming the file, the file's
//! content, then a `---` rule. The standard modes strip the table flag and
//! remember that a table was seen; `Summary` uses the content verbatim.
//!
//! ## Tabular modes (`SummaryTable`, `Condensed`)
//!
//! One fixed six-column header, then the row(s) each file produced. Rows
//! are shaped so the table stays well formed: short rows are padded, stray
//! separator rows and repeated headers are dropped. A file without a usable
//! row, or whose analysis failed, gets a placeholder row instead.
//!
//! A failed file never aborts the merge; it is rendered as a placeholder.

use crate::config::ExtractionMode;
use crate::error::FileError;
use crate::output::AnalysisResult;
use crate::pipeline::fragment::{is_pipe_row, is_separator_row};
use crate::pipeline::table::{parse_row, render_row};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sentinel the provider appends when its answer contains a table.
pub const TABLE_FLAG: &str = "---TABLE_DETECTED---";

/// Column labels of the tabular-mode roll-up table.
pub const TABULAR_COLUMNS: [&str; 6] = [
    "Nội dung",
    "Số hiệu",
    "Ngày tháng",
    "Cơ quan ban hành",
    "Giá trị",
    "Nội dung chính",
];

/// Row substituted when a file's analysis failed in a tabular mode.
pub const TABULAR_FAILED_ROW: &str = "|  |  |  |  |  | Lỗi phân tích: dữ liệu không hợp lệ |";

/// Row substituted when a tabular-mode answer carried no table row.
pub const TABULAR_MISSING_ROW: &str = "|  |  |  |  |  | Lỗi trích xuất: không có dữ liệu |";

/// Body of the section substituted for a failed file in narrative modes.
pub const NARRATIVE_FAILED_BODY: &str = "Không thể xử lý tài liệu này.";

const SECTION_RULE: &str = "\n\n---\n\n";

/// One file's contribution to the merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInput {
    /// File name shown in section headers.
    pub label: String,
    /// The analysed answer, or why there is none.
    pub result: Result<AnalysisResult, FileError>,
}

impl MergeInput {
    pub fn ok(label: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            label: label.into(),
            result: Ok(result),
        }
    }

    pub fn failed(label: impl Into<String>, error: FileError) -> Self {
        Self {
            label: label.into(),
            result: Err(error),
        }
    }

    /// Sort key date; failed files count as undated.
    pub fn date(&self) -> Option<NaiveDate> {
        self.result.as_ref().ok().and_then(|r| r.date)
    }
}

/// The assembled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedDocument {
    pub markdown: String,
    /// Always true for tabular modes; for narrative modes, true iff some
    /// answer carried the table flag.
    pub has_table: bool,
}

/// Remove every occurrence of [`TABLE_FLAG`] from `content`.
///
/// Returns the content (trimmed when the flag was present, untouched
/// otherwise) and whether the flag was found.
pub fn strip_table_flag(content: &str) -> (String, bool) {
    if content.contains(TABLE_FLAG) {
        (content.replace(TABLE_FLAG, "").trim().to_string(), true)
    } else {
        (content.to_string(), false)
    }
}

/// Indices into `inputs` in document order.
pub fn sort_order(inputs: &[MergeInput]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..inputs.len()).collect();
    // `sort_by_key` is stable: ties keep submitted order.
    order.sort_by_key(|&i| {
        let date = inputs[i].date();
        (date.is_none(), date)
    });
    order
}

/// Order `inputs` by date and assemble them according to `mode`.
pub fn merge(inputs: &[MergeInput], mode: ExtractionMode) -> MergedDocument {
    let order = sort_order(inputs);
    let sorted: Vec<&MergeInput> = order.iter().map(|&i| &inputs[i]).collect();
    debug!("Merging {} file(s) in {} mode", sorted.len(), mode);

    if mode.is_tabular() {
        merge_tabular(&sorted)
    } else {
        merge_narrative(&sorted, mode)
    }
}

/// Highlighted per-file section header, without trailing blank line.
pub fn section_header(label: &str, failed: bool) -> String {
    let suffix = if failed { " (Lỗi phân tích)" } else { "" };
    format!(
        "## **<span style=\"background-color: #fcfc0a;\">Kết quả cho tệp: {}{}</span>**",
        label, suffix
    )
}

fn merge_narrative(sorted: &[&MergeInput], mode: ExtractionMode) -> MergedDocument {
    let mut out = String::new();
    let mut has_table = false;

    for input in sorted {
        match &input.result {
            Err(e) => {
                warn!("Substituting error section for '{}': {}", input.label, e);
                out.push_str(&section_header(&input.label, true));
                out.push_str("\n\n");
                out.push_str(NARRATIVE_FAILED_BODY);
            }
            Ok(result) => {
                out.push_str(&section_header(&input.label, false));
                out.push_str("\n\n");
                if mode.expects_table_flag() {
                    let (content, flagged) = strip_table_flag(&result.content);
                    has_table |= flagged;
                    out.push_str(&content);
                } else {
                    out.push_str(&result.content);
                }
            }
        }
        out.push_str(SECTION_RULE);
    }

    MergedDocument {
        markdown: out.trim().to_string(),
        has_table,
    }
}

fn merge_tabular(sorted: &[&MergeInput]) -> MergedDocument {
    let mut lines = vec![
        render_row(&TABULAR_COLUMNS[..]),
        render_row(&["---"; 6][..]),
    ];

    for input in sorted {
        let result = match &input.result {
            Ok(r) => r,
            Err(e) => {
                warn!("Substituting error row for '{}': {}", input.label, e);
                lines.push(TABULAR_FAILED_ROW.to_string());
                continue;
            }
        };

        let (content, flagged) = strip_table_flag(&result.content);
        let rows = if flagged {
            let shaped = shape_rows(&content, &input.label);
            if shaped.discarded > 0 {
                warn!(
                    "Discarded {} non-row line(s) from '{}'",
                    shaped.discarded, input.label
                );
            }
            shaped.rows
        } else {
            Vec::new()
        };
        if rows.is_empty() {
            warn!(
                "No table row for '{}' (flag {}); substituting placeholder",
                input.label,
                if flagged { "present" } else { "missing" }
            );
            lines.push(TABULAR_MISSING_ROW.to_string());
        } else {
            lines.extend(rows);
        }
    }

    MergedDocument {
        markdown: lines.join("\n").trim_end().to_string(),
        has_table: true,
    }
}

/// Data rows of one tabular answer, plus how many non-empty lines that
/// were not table rows had to be dropped.
#[derive(Debug, Default, PartialEq, Eq)]
struct ShapedRows {
    rows: Vec<String>,
    discarded: usize,
}

/// Keep the data rows of one tabular answer, shaped to the six-column
/// header. Rows wider than the header are kept whole.
fn shape_rows(content: &str, label: &str) -> ShapedRows {
    let width = TABULAR_COLUMNS.len();
    let mut shaped = ShapedRows::default();

    for line in content.lines().map(str::trim) {
        if line.is_empty() || is_separator_row(line) || is_aligned_separator(line) {
            continue;
        }
        if !is_pipe_row(line) {
            debug!("Dropping non-row line from '{}': {:?}", label, line);
            shaped.discarded += 1;
            continue;
        }
        let mut cells = parse_row(line);
        if cells.iter().map(String::as_str).eq(TABULAR_COLUMNS) {
            continue;
        }
        match cells.len() {
            n if n == width => shaped.rows.push(line.to_string()),
            n if n < width => {
                warn!("Row for '{}' has {} of {} cells; padding", label, n, width);
                cells.resize(width, String::new());
                shaped.rows.push(render_row(&cells));
            }
            n => {
                warn!("Row for '{}' has {} cells, more than {}; kept as is", label, n, width);
                shaped.rows.push(line.to_string());
            }
        }
    }
    shaped
}

/// A GFM separator with alignment colons (`|:---|--:|`). It never opens a
/// table, but in a tabular answer it is still not a data row.
fn is_aligned_separator(line: &str) -> bool {
    is_pipe_row(line)
        && parse_row(line).iter().all(|cell| {
            let dashes = cell.trim_matches(':');
            !dashes.is_empty() && dashes.chars().all(|c| c == '-')
        })
}
