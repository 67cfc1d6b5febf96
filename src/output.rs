//! Result types returned by an analysis run.

use crate::config::ExtractionMode;
use crate::document::EditableDocument;
use crate::error::FileError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One provider answer after date extraction.
///
/// `date` is `None` when the marker was absent, said "not found", or did
/// not name a real calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub content: String,
    pub date: Option<NaiveDate>,
}

impl AnalysisResult {
    pub fn new(content: impl Into<String>, date: Option<NaiveDate>) -> Self {
        Self {
            content: content.into(),
            date,
        }
    }
}

/// Per-file bookkeeping for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// 1-based position in the submitted order.
    pub index: usize,
    /// Display name of the file (used in section headers).
    pub name: String,
    /// Number of image parts sent to the provider.
    pub parts: usize,
    /// Document date found in the answer, if any.
    pub date: Option<NaiveDate>,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
    /// Set when the file is rendered as an error placeholder.
    pub error: Option<FileError>,
}

/// Aggregate statistics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_files: usize,
    pub analysed_files: usize,
    pub failed_files: usize,
    /// Files whose answer carried a usable date marker.
    pub dated_files: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

/// The merged document plus everything needed to explain how it was built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Assembled Markdown, files ordered by document date.
    pub markdown: String,
    /// True when the document contains at least one table the UI should
    /// treat as a table.
    pub has_table: bool,
    pub mode: ExtractionMode,
    /// Reports in submitted order (not document order).
    pub files: Vec<FileReport>,
    pub stats: AnalysisStats,
}

impl AnalysisOutput {
    /// Split the merged Markdown into an editable fragment arena.
    ///
    /// Tables are editable unless the run used a tabular mode.
    pub fn document(&self) -> EditableDocument {
        EditableDocument::new(&self.markdown, self.mode)
    }

    /// Reports of the files that were replaced by an error placeholder.
    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(index: usize, error: Option<FileError>) -> FileReport {
        FileReport {
            index,
            name: format!("f{index}.png"),
            parts: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, index as u32),
            input_tokens: 10,
            output_tokens: 5,
            duration_ms: 1,
            error,
        }
    }

    #[test]
    fn failed_files_filters_errors() {
        let out = AnalysisOutput {
            markdown: "x".into(),
            has_table: false,
            mode: ExtractionMode::Summary,
            files: vec![
                report(1, None),
                report(
                    2,
                    Some(FileError::EmptyResponse {
                        file: "f2.png".into(),
                    }),
                ),
            ],
            stats: AnalysisStats::default(),
        };
        let failed: Vec<usize> = out.failed_files().map(|f| f.index).collect();
        assert_eq!(failed, vec![2]);
    }

    #[test]
    fn output_is_json_serialisable() {
        let out = AnalysisOutput {
            markdown: "| a |\n|---|\n| 1 |".into(),
            has_table: true,
            mode: ExtractionMode::Condensed,
            files: vec![report(1, None)],
            stats: AnalysisStats {
                total_files: 1,
                analysed_files: 1,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains("\"mode\":\"condensed\""));
        assert!(json.contains("\"date\":\"2024-03-01\""));
    }
}
