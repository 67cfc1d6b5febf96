//! # edgequake-docmerge
//!
//! Analyse a batch of scanned documents (images or PDFs) with a Vision
//! Language Model and merge the per-file answers into one ordered, editable
//! Markdown document.
//!
//! ## Why this crate?
//!
//! Each file is analysed on its own, but the reader wants one document:
//! files ordered by the date printed on them, tables that stay well formed,
//! and a visible placeholder where a file could not be read. The hard part
//! is the assembly pipeline, not the model call:
//!
//! - the model reports each document's date in-band (`NGAY_THANG: …`) and
//!   flags tables with a sentinel line (`---TABLE_DETECTED---`)
//! - the merge orders files by that date, undated files last, and applies
//!   the extraction mode's policy: one section per file, or one table row
//!   per file
//! - the merged document splits losslessly into prose and table fragments,
//!   and each table converts to an editable grid and back
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Input    resolve paths / URLs, sniff image vs PDF
//!  ├─ 2. Parts    images pass through, PDF pages rasterised via pdfium
//!  ├─ 3. VLM      one call per file (concurrent, order preserved)
//!  ├─ 4. Polish   fences, line endings, invisible characters
//!  ├─ 5. Date     strip the NGAY_THANG marker, parse the date
//!  ├─ 6. Merge    order by date, assemble per extraction mode
//!  └─ 7. Edit     split into fragments, tables ⇄ grids
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docmerge::{analyze, AnalysisConfig, ExtractionMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = AnalysisConfig::builder()
//!         .mode(ExtractionMode::Condensed)
//!         .build()?;
//!     let output = analyze(&["to-trinh.pdf", "quyet-dinh.jpg"], &config).await?;
//!     println!("{}", output.markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docmerge` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docmerge = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_files, analyze_sync, analyze_to_file, analyze_with, resolve_provider};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ExtractionMode};
pub use document::{CellFormat, EditableDocument, TableEdit, TableEditor};
pub use error::{DocMergeError, FileError, SessionError, TableEditError};
pub use output::{AnalysisOutput, AnalysisResult, AnalysisStats, FileReport};
pub use pipeline::fragment::{DocumentFragment, FragmentId, FragmentKind};
pub use pipeline::input::UploadedFile;
pub use pipeline::llm::{AnalyzerError, DocumentAnalyzer, RawAnalysis, VlmAnalyzer};
pub use pipeline::merge::{merge, MergeInput, MergedDocument};
pub use pipeline::parts::FilePart;
pub use pipeline::table::TableGrid;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{Session, SessionEvent, SessionState};
