//! Offline integration tests for the assembly pipeline.
//!
//! A scripted [`DocumentAnalyzer`] stands in for the provider, and inputs
//! are PNG-signature byte buffers, so no network access or pdfium library
//! is needed.
//!
//! Run with:
//!   cargo test --test assembly

use async_trait::async_trait;
use edgequake_docmerge::pipeline::merge::{
    TABLE_FLAG, TABULAR_COLUMNS, TABULAR_FAILED_ROW, TABULAR_MISSING_ROW,
};
use edgequake_docmerge::session::{EMPTY_SELECTION_MESSAGE, GENERIC_FAILURE_MESSAGE};
use edgequake_docmerge::{
    analyze_with, AnalysisConfig, AnalysisProgressCallback, AnalyzerError, DocMergeError,
    DocumentAnalyzer, ExtractionMode, FilePart, FileError, RawAnalysis, Session, SessionState,
    TableEdit, UploadedFile,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A PNG-signature buffer whose tail identifies the file to the analyzer.
fn png(name: &str) -> UploadedFile {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(name.as_bytes());
    UploadedFile::new(name, bytes).expect("PNG signature should be recognised")
}

/// Answers keyed by file name; unknown files get an `AnalyzerError`.
struct ScriptedAnalyzer {
    answers: HashMap<String, Result<String, String>>,
    calls: Mutex<Vec<(String, ExtractionMode)>>,
}

impl ScriptedAnalyzer {
    fn new(answers: &[(&str, Result<&str, &str>)]) -> Arc<Self> {
        Arc::new(Self {
            answers: answers
                .iter()
                .map(|(name, r)| {
                    let r = r.map(str::to_string).map_err(str::to_string);
                    (name.to_string(), r)
                })
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(String, ExtractionMode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentAnalyzer for ScriptedAnalyzer {
    async fn analyze(
        &self,
        parts: &[FilePart],
        mode: ExtractionMode,
    ) -> Result<RawAnalysis, AnalyzerError> {
        let part = parts.first().ok_or(AnalyzerError::Empty)?;
        let name = String::from_utf8_lossy(&part.data[PNG_SIGNATURE.len()..]).to_string();
        self.calls.lock().unwrap().push((name.clone(), mode));
        match self.answers.get(&name) {
            Some(Ok(text)) => Ok(RawAnalysis {
                text: text.clone(),
                input_tokens: 100,
                output_tokens: 20,
            }),
            Some(Err(detail)) => Err(AnalyzerError::Provider(detail.clone())),
            None => Err(AnalyzerError::Provider(format!("no answer for {name}"))),
        }
    }
}

fn config(mode: ExtractionMode) -> AnalysisConfig {
    AnalysisConfig::builder()
        .mode(mode)
        .concurrency(3)
        .build()
        .unwrap()
}

fn header_position(md: &str, label: &str) -> usize {
    md.find(&format!("Kết quả cho tệp: {label}"))
        .unwrap_or_else(|| panic!("no section for {label} in:\n{md}"))
}

// ── Narrative modes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn standard_sections_follow_document_dates() {
    let files = vec![png("b.png"), png("a.png"), png("undated.png")];
    let analyzer = ScriptedAnalyzer::new(&[
        ("b.png", Ok("NGAY_THANG: 2024-03-10\nQuyết định số 12")),
        ("a.png", Ok("NGAY_THANG: 2023-12-01\nTờ trình số 7")),
        ("undated.png", Ok("NGAY_THANG: Khong tim thay\nGhi chú")),
    ]);

    let out = analyze_with(&files, analyzer.clone(), &config(ExtractionMode::Standard))
        .await
        .unwrap();

    let md = &out.markdown;
    assert!(header_position(md, "a.png") < header_position(md, "b.png"));
    assert!(header_position(md, "b.png") < header_position(md, "undated.png"));
    assert!(!md.contains("NGAY_THANG"), "date markers must not reach the document");
    assert!(md.contains("Tờ trình số 7"));
    assert!(!out.has_table);

    // Reports stay in submitted order.
    let names: Vec<&str> = out.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["b.png", "a.png", "undated.png"]);
    assert_eq!(out.stats.dated_files, 2);
    assert_eq!(out.stats.total_input_tokens, 300);
    assert!(analyzer.calls().iter().all(|(_, m)| *m == ExtractionMode::Standard));
}

#[tokio::test]
async fn standard_two_file_document_layout() {
    let files = vec![png("x.jpg.png"), png("y.png")];
    let analyzer = ScriptedAnalyzer::new(&[
        ("x.jpg.png", Ok("NGAY_THANG: 2024-01-05\nNội dung X")),
        ("y.png", Ok("NGAY_THANG: 2024-01-04\nNội dung Y")),
    ]);

    let out = analyze_with(&files, analyzer, &config(ExtractionMode::Standard))
        .await
        .unwrap();

    let y = "## **<span style=\"background-color: #fcfc0a;\">Kết quả cho tệp: y.png</span>**";
    let x = "## **<span style=\"background-color: #fcfc0a;\">Kết quả cho tệp: x.jpg.png</span>**";
    let expected = format!("{y}\n\nNội dung Y\n\n---\n\n{x}\n\nNội dung X\n\n---");
    assert_eq!(out.markdown, expected);
}

#[tokio::test]
async fn table_flag_is_stripped_and_reported() {
    let files = vec![png("t.png")];
    let answer = format!(
        "NGAY_THANG: 2024-02-02\nDanh sách\n\n| Tên | Số |\n|---|---|\n| A | 1 |\n\n{TABLE_FLAG}"
    );
    let analyzer = ScriptedAnalyzer::new(&[("t.png", Ok(answer.as_str()))]);

    let out = analyze_with(&files, analyzer, &config(ExtractionMode::Standard))
        .await
        .unwrap();

    assert!(out.has_table);
    assert!(!out.markdown.contains(TABLE_FLAG));
    let doc = out.document();
    assert_eq!(doc.table_ids().len(), 1);
    assert!(doc.is_editable());
}

#[tokio::test]
async fn summary_mode_keeps_content_verbatim() {
    let files = vec![png("s.png")];
    let analyzer = ScriptedAnalyzer::new(&[("s.png", Ok("NGAY_THANG: 2024-05-06\n- ý chính"))]);

    let out = analyze_with(&files, analyzer, &config(ExtractionMode::Summary))
        .await
        .unwrap();

    assert!(out.markdown.contains("- ý chính"));
    assert!(!out.has_table);
}

#[tokio::test]
async fn failed_file_becomes_placeholder_section() {
    let files = vec![png("ok.png"), png("bad.png")];
    let analyzer = ScriptedAnalyzer::new(&[
        ("ok.png", Ok("NGAY_THANG: 2024-01-01\nổn")),
        ("bad.png", Err("quota exceeded")),
    ]);

    let out = analyze_with(&files, analyzer, &config(ExtractionMode::Standard))
        .await
        .unwrap();

    assert!(out
        .markdown
        .contains("Kết quả cho tệp: bad.png (Lỗi phân tích)"));
    assert_eq!(out.stats.analysed_files, 1);
    assert_eq!(out.stats.failed_files, 1);

    let failed: Vec<_> = out.failed_files().collect();
    assert_eq!(failed.len(), 1);
    match failed[0].error.as_ref().unwrap() {
        FileError::AnalysisFailed { file, detail } => {
            assert_eq!(file, "bad.png");
            assert!(detail.contains("quota exceeded"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn whitespace_answer_counts_as_empty_response() {
    let files = vec![png("blank.png")];
    let analyzer = ScriptedAnalyzer::new(&[("blank.png", Ok("```markdown\n\n```"))]);

    let out = analyze_with(&files, analyzer, &config(ExtractionMode::Summary))
        .await
        .unwrap();

    assert!(matches!(
        out.files[0].error,
        Some(FileError::EmptyResponse { .. })
    ));
}

// ── Tabular modes ────────────────────────────────────────────────────────────

#[tokio::test]
async fn condensed_rows_follow_dates_with_placeholders() {
    let files = vec![png("late.png"), png("noflag.png"), png("early.png"), png("err.png")];
    let late = format!("NGAY_THANG: 2024-06-01\n| QĐ | 5/QĐ | 01/06/2024 | UBND | | Phê duyệt |\n{TABLE_FLAG}");
    let early = format!(
        "NGAY_THANG: 2024-01-15\n| Tờ trình | 1/TTr | 15/01/2024 | Sở |\n{TABLE_FLAG}"
    );
    let analyzer = ScriptedAnalyzer::new(&[
        ("late.png", Ok(late.as_str())),
        ("noflag.png", Ok("NGAY_THANG: 2024-03-01\nkhông có bảng")),
        ("early.png", Ok(early.as_str())),
        ("err.png", Err("timeout")),
    ]);

    let out = analyze_with(&files, analyzer, &config(ExtractionMode::Condensed))
        .await
        .unwrap();

    assert!(out.has_table);
    let lines: Vec<&str> = out.markdown.lines().collect();
    assert_eq!(lines.len(), 2 + 4);
    assert_eq!(lines[0], format!("| {} |", TABULAR_COLUMNS.join(" | ")));
    // early (padded to six cells), noflag, late, then the failed file.
    assert_eq!(lines[2], "| Tờ trình | 1/TTr | 15/01/2024 | Sở |  |  |");
    assert_eq!(lines[3], TABULAR_MISSING_ROW);
    assert!(lines[4].contains("5/QĐ"));
    assert_eq!(lines[5], TABULAR_FAILED_ROW);

    // The roll-up table is a single read-only fragment.
    let doc = out.document();
    assert_eq!(doc.fragments().len(), 1);
    let id = doc.table_ids()[0];
    assert!(!doc.editor(id).unwrap().is_editable());
}

#[tokio::test]
async fn summary_table_drops_repeated_header_and_separator() {
    let files = vec![png("r.png")];
    let answer = format!(
        "NGAY_THANG: 2024-02-02\n| {} |\n|---|---|---|---|---|---|\n| a | b | c | d | e | f |\n{TABLE_FLAG}",
        TABULAR_COLUMNS.join(" | ")
    );
    let analyzer = ScriptedAnalyzer::new(&[("r.png", Ok(answer.as_str()))]);

    let out = analyze_with(&files, analyzer, &config(ExtractionMode::SummaryTable))
        .await
        .unwrap();

    let lines: Vec<&str> = out.markdown.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "| a | b | c | d | e | f |");
}

// ── Run-level behaviour ──────────────────────────────────────────────────────

#[derive(Default)]
struct CountingCallback {
    started: AtomicUsize,
    completed: AtomicUsize,
    errored: AtomicUsize,
    finished: Mutex<Option<(usize, usize)>>,
}

impl AnalysisProgressCallback for CountingCallback {
    fn on_file_start(&self, _index: usize, _total: usize, _name: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_file_complete(&self, _index: usize, _total: usize, _name: &str, _len: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_file_error(&self, _index: usize, _total: usize, _name: &str, _error: &str) {
        self.errored.fetch_add(1, Ordering::SeqCst);
    }
    fn on_run_complete(&self, total_files: usize, success_count: usize) {
        *self.finished.lock().unwrap() = Some((total_files, success_count));
    }
}

#[tokio::test]
async fn progress_callback_sees_every_file() {
    let cb = Arc::new(CountingCallback::default());
    let cfg = AnalysisConfig::builder()
        .mode(ExtractionMode::Summary)
        .progress_callback(cb.clone())
        .build()
        .unwrap();
    let files = vec![png("1.png"), png("2.png"), png("3.png")];
    let analyzer = ScriptedAnalyzer::new(&[("1.png", Ok("a")), ("3.png", Ok("c"))]);

    analyze_with(&files, analyzer, &cfg).await.unwrap();

    assert_eq!(cb.started.load(Ordering::SeqCst), 3);
    assert_eq!(cb.completed.load(Ordering::SeqCst), 2);
    assert_eq!(cb.errored.load(Ordering::SeqCst), 1);
    assert_eq!(*cb.finished.lock().unwrap(), Some((3, 2)));
}

#[tokio::test]
async fn empty_and_unsupported_selections_are_fatal() {
    let analyzer = ScriptedAnalyzer::new(&[]);
    let err = analyze_with(&[], analyzer.clone(), &config(ExtractionMode::Standard))
        .await
        .unwrap_err();
    assert!(matches!(err, DocMergeError::NoInputs));

    let text = UploadedFile {
        name: "notes.txt".into(),
        mime_type: "text/plain".into(),
        bytes: b"hello".to_vec(),
    };
    let err = analyze_with(&[png("a.png"), text], analyzer.clone(), &config(ExtractionMode::Standard))
        .await
        .unwrap_err();
    assert!(matches!(err, DocMergeError::UnsupportedFormat { .. }));
    assert!(analyzer.calls().is_empty(), "no provider call before validation");
}

#[test]
fn unrecognised_bytes_are_rejected_at_upload() {
    let err = UploadedFile::new("notes.txt", b"plain text".to_vec()).unwrap_err();
    assert!(matches!(err, DocMergeError::UnsupportedFormat { .. }));
}

// ── Editing the merged document ──────────────────────────────────────────────

#[tokio::test]
async fn edits_change_only_the_edited_table() {
    let files = vec![png("one.png"), png("two.png")];
    let one = format!("NGAY_THANG: 2024-01-01\n| A | B |\n|---|---|\n| 1 | 2 |\n{TABLE_FLAG}");
    let two = format!("NGAY_THANG: 2024-01-02\n| C |\n|---|\n| 3 |\n{TABLE_FLAG}");
    let analyzer = ScriptedAnalyzer::new(&[("one.png", Ok(one.as_str())), ("two.png", Ok(two.as_str()))]);

    let out = analyze_with(&files, analyzer, &config(ExtractionMode::Standard))
        .await
        .unwrap();

    let mut doc = out.document();
    assert_eq!(doc.markdown(), out.markdown, "split must be lossless");

    let ids = doc.table_ids();
    assert_eq!(ids.len(), 2);
    let second_before = doc.fragment(ids[1]).unwrap().content.clone();

    let changed = doc
        .apply(ids[0], TableEdit::SetCell { row: 0, col: 1, value: "20".into() })
        .unwrap();
    assert!(changed);
    assert!(doc.markdown().contains("| 1 | 20 |"));
    assert_eq!(doc.fragment(ids[1]).unwrap().content, second_before);

    let changed = doc.apply(ids[0], TableEdit::InsertColumnAfter(1)).unwrap();
    assert!(changed);
    assert_eq!(doc.editor(ids[0]).unwrap().grid().header[2], "New Column");
}

// ── Session workflow ─────────────────────────────────────────────────────────

#[tokio::test]
async fn session_generate_succeeds_and_exposes_document() {
    let mut session = Session::new();
    session.set_mode(ExtractionMode::Summary).unwrap();
    session.select_files(vec![png("s1.png")]).unwrap();
    let analyzer = ScriptedAnalyzer::new(&[("s1.png", Ok("NGAY_THANG: 2024-07-07\n- tóm tắt"))]);

    let state = session
        .generate(analyzer.clone(), &AnalysisConfig::default())
        .await
        .unwrap();
    match state {
        SessionState::Succeeded { output, .. } => assert_eq!(output.mode, ExtractionMode::Summary),
        other => panic!("unexpected state {}", other.name()),
    }
    assert!(session.document().is_some());
    // The session's mode wins over the config's.
    assert_eq!(analyzer.calls()[0].1, ExtractionMode::Summary);
}

#[tokio::test]
async fn session_generate_without_files_fails_with_message() {
    let mut session = Session::new();
    let analyzer = ScriptedAnalyzer::new(&[]);

    let state = session
        .generate(analyzer, &AnalysisConfig::default())
        .await
        .unwrap();
    match state {
        SessionState::Failed { message } => assert_eq!(message, EMPTY_SELECTION_MESSAGE),
        other => panic!("unexpected state {}", other.name()),
    }
    assert!(!session.is_busy());
}

#[tokio::test]
async fn session_surfaces_fatal_errors_generically() {
    let mut session = Session::new();
    let text = UploadedFile {
        name: "notes.txt".into(),
        mime_type: "text/plain".into(),
        bytes: b"hello".to_vec(),
    };
    session.select_files(vec![text]).unwrap();

    let state = session
        .generate(ScriptedAnalyzer::new(&[]), &AnalysisConfig::default())
        .await
        .unwrap();
    match state {
        SessionState::Failed { message } => assert_eq!(message, GENERIC_FAILURE_MESSAGE),
        other => panic!("unexpected state {}", other.name()),
    }
    assert!(session.document().is_none());
}
