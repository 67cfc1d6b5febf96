//! Error types for the edgequake-docmerge library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocMergeError`] is **fatal**: the run cannot proceed at all (input
//!   missing, unsupported format, provider not configured). Returned as
//!   `Err(DocMergeError)` from the top-level `analyze*` functions.
//!
//! * [`FileError`] is **non-fatal**: one uploaded file could not be analysed
//!   (rasterisation glitch, provider error, empty answer). Stored inside
//!   [`crate::output::FileReport`]; the merge step substitutes a visible
//!   error placeholder for that file and the batch carries on.
//!
//! Table editing and session bookkeeping have their own small error enums
//! ([`TableEditError`], [`SessionError`]) because they never cross the
//! network boundary and callers usually match on them directly.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-docmerge library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum DocMergeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file is neither an image nor a PDF.
    #[error("Unsupported format for '{name}' (detected: {detected})\nOnly images and PDF files can be analysed.")]
    UnsupportedFormat { name: String, detected: String },

    /// The run was started with an empty file selection.
    #[error("No input files were provided")]
    NoInputs,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single uploaded file.
///
/// The merge step renders it as an error row (tabular modes) or an error
/// section (narrative modes). The overall run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The file could not be turned into image parts (PDF rasterisation or
    /// image encoding failed).
    #[error("{file}: conversion to images failed: {detail}")]
    Conversion { file: String, detail: String },

    /// The provider call itself failed.
    #[error("{file}: document analysis failed: {detail}")]
    AnalysisFailed { file: String, detail: String },

    /// The provider answered but the answer carried no usable text.
    #[error("{file}: document analysis returned no text")]
    EmptyResponse { file: String },
}

impl FileError {
    /// Name of the file this error belongs to.
    pub fn file(&self) -> &str {
        match self {
            FileError::Conversion { file, .. }
            | FileError::AnalysisFailed { file, .. }
            | FileError::EmptyResponse { file } => file,
        }
    }
}

/// Errors raised by the editable table model and the document arena.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableEditError {
    /// A row or column index does not exist in the grid.
    #[error("{axis} index {index} is out of bounds (len {len})")]
    OutOfBounds {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    /// The table belongs to a tabular extraction mode and cannot be edited.
    #[error("table is read-only")]
    ReadOnly,

    /// No fragment with this id exists in the document.
    #[error("unknown fragment '{0}'")]
    UnknownFragment(String),

    /// The fragment exists but is prose, not a table.
    #[error("fragment '{0}' is not a table")]
    NotATable(String),
}

/// Invalid workflow transitions in [`crate::session::Session`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The event is not accepted in the current state.
    #[error("cannot apply '{event}' while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    /// A run is already in flight.
    #[error("an analysis run is already in progress")]
    Busy,
}
