//! Progress-callback trait for per-file analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events as the run works through the uploaded files.
//!
//! Events report progress only. The assembled document is produced once,
//! after every file has finished, so no partial Markdown is ever handed to
//! the callback.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docmerge::{AnalysisConfig, AnalysisProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl AnalysisProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, name: &str, _chars: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}/{total}: {name} (#{index})");
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the analysis run as it processes each file.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` the
/// per-file methods may be called from several tasks at once. All methods
/// have default no-op implementations.
///
/// File indices are 1-based positions in the submitted order.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once before any file is converted.
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is converted and sent to the provider.
    fn on_file_start(&self, index: usize, total_files: usize, name: &str) {
        let _ = (index, total_files, name);
    }

    /// Called when a file was analysed successfully.
    ///
    /// `content_len` is the byte length of the answer after the date marker
    /// was stripped.
    fn on_file_complete(&self, index: usize, total_files: usize, name: &str, content_len: usize) {
        let _ = (index, total_files, name, content_len);
    }

    /// Called when a file failed; it will appear as an error placeholder.
    fn on_file_error(&self, index: usize, total_files: usize, name: &str, error: &str) {
        let _ = (index, total_files, name, error);
    }

    /// Called once after the merged document has been assembled.
    fn on_run_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
