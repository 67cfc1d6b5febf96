//! Pipeline stages for batch document analysis.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//!            per file (concurrent)                        whole batch
//! input ──▶ parts ──▶ llm ──▶ postprocess ──▶ date ──▶ merge ──▶ fragment ──▶ table
//! (sniff)  (pdfium)  (VLM)    (cleanup)     (marker)  (order)   (split)     (grid)
//! ```
//!
//! 1. [`input`]: resolve a path or URL to an [`input::UploadedFile`] and
//!    sniff its format
//! 2. [`parts`]: images pass through, PDFs are rasterised by [`render`] in
//!    `spawn_blocking` and PNG-encoded by [`encode`]
//! 3. [`llm`]: one provider call per file; the only stage with network I/O
//! 4. [`postprocess`]: deterministic cleanup of model quirks
//! 5. [`date`]: pull the `NGAY_THANG:` marker out of the answer
//! 6. [`merge`]: barrier; order by date and assemble per the extraction mode
//! 7. [`fragment`]: split the assembled document into prose and tables
//! 8. [`table`]: Markdown table ⇄ editable grid

pub mod date;
pub mod encode;
pub mod fragment;
pub mod input;
pub mod llm;
pub mod merge;
pub mod parts;
pub mod postprocess;
pub mod render;
pub mod table;
