//! Workflow state for one interactive session.
//!
//! A session holds the current file selection and extraction mode, plus one
//! [`SessionState`]:
//!
//! ```text
//!   Idle ──Start──▶ Running ──Complete──▶ Succeeded
//!    ▲                 │
//!    │                 └──────Fail──────▶ Failed
//!    └──FilesSelected── (any state but Running)
//! ```
//!
//! Every change goes through [`transition`], so combinations such as
//! "running and failed at once" cannot be represented. A second `Start`
//! while a run is in flight is refused with [`SessionError::Busy`].

use crate::analyze::analyze_with;
use crate::config::{AnalysisConfig, ExtractionMode};
use crate::document::EditableDocument;
use crate::error::SessionError;
use crate::output::AnalysisOutput;
use crate::pipeline::input::UploadedFile;
use crate::pipeline::llm::DocumentAnalyzer;
use std::sync::Arc;
use tracing::{error, info};

/// Shown when a run is started with no files selected.
pub const EMPTY_SELECTION_MESSAGE: &str = "Vui lòng chọn một hoặc nhiều tệp để phân tích.";

/// Shown for any fatal error; details go to the log only.
pub const GENERIC_FAILURE_MESSAGE: &str = "Đã xảy ra lỗi trong quá trình phân tích. Vui lòng thử lại.";

#[derive(Debug, Clone)]
pub enum SessionState {
    /// Nothing to show yet.
    Idle,
    /// A run is in flight.
    Running { files: usize, mode: ExtractionMode },
    /// The last run finished. `document` carries any edits made since.
    Succeeded {
        output: Box<AnalysisOutput>,
        document: EditableDocument,
    },
    /// The last run could not produce a document.
    Failed { message: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running { .. } => "running",
            SessionState::Succeeded { .. } => "succeeded",
            SessionState::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The user picked a new set of files.
    FilesSelected,
    /// The user asked for a run over `files` files in `mode`.
    Start { files: usize, mode: ExtractionMode },
    /// The run produced a document.
    Complete(Box<AnalysisOutput>),
    /// The run failed with a user-facing message.
    Fail { message: String },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::FilesSelected => "files-selected",
            SessionEvent::Start { .. } => "start",
            SessionEvent::Complete(_) => "complete",
            SessionEvent::Fail { .. } => "fail",
        }
    }
}

/// The single transition function.
///
/// `Start` with zero files goes straight to `Failed` with
/// [`EMPTY_SELECTION_MESSAGE`] and never enters `Running`.
pub fn transition(state: &SessionState, event: SessionEvent) -> Result<SessionState, SessionError> {
    let running = matches!(state, SessionState::Running { .. });
    match (running, event) {
        (true, SessionEvent::FilesSelected) | (true, SessionEvent::Start { .. }) => Err(SessionError::Busy),
        (false, SessionEvent::FilesSelected) => Ok(SessionState::Idle),
        (false, SessionEvent::Start { files: 0, .. }) => Ok(SessionState::Failed {
            message: EMPTY_SELECTION_MESSAGE.to_string(),
        }),
        (false, SessionEvent::Start { files, mode }) => Ok(SessionState::Running { files, mode }),
        (true, SessionEvent::Complete(output)) => {
            let document = output.document();
            Ok(SessionState::Succeeded { output, document })
        }
        (true, SessionEvent::Fail { message }) => Ok(SessionState::Failed { message }),
        (false, event) => Err(SessionError::InvalidTransition {
            state: state.name(),
            event: event.name(),
        }),
    }
}

/// Selection, mode and workflow state of one user session.
#[derive(Debug, Clone)]
pub struct Session {
    files: Vec<UploadedFile>,
    mode: ExtractionMode,
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            mode: ExtractionMode::default(),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, SessionState::Running { .. })
    }

    fn apply(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        self.state = transition(&self.state, event)?;
        Ok(())
    }

    /// Replace the selection. Clears any previous result.
    pub fn select_files(&mut self, files: Vec<UploadedFile>) -> Result<(), SessionError> {
        self.apply(SessionEvent::FilesSelected)?;
        self.files = files;
        Ok(())
    }

    /// Change the mode used by the next run.
    pub fn set_mode(&mut self, mode: ExtractionMode) -> Result<(), SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        self.mode = mode;
        Ok(())
    }

    /// The editable document of the last successful run.
    pub fn document(&self) -> Option<&EditableDocument> {
        match &self.state {
            SessionState::Succeeded { document, .. } => Some(document),
            _ => None,
        }
    }

    pub fn document_mut(&mut self) -> Option<&mut EditableDocument> {
        match &mut self.state {
            SessionState::Succeeded { document, .. } => Some(document),
            _ => None,
        }
    }

    /// Run the analysis over the current selection.
    ///
    /// `config.mode` is replaced by the session's mode. Any fatal error is
    /// logged and surfaced as [`GENERIC_FAILURE_MESSAGE`]; no partial
    /// document is kept.
    pub async fn generate(
        &mut self,
        analyzer: Arc<dyn DocumentAnalyzer>,
        config: &AnalysisConfig,
    ) -> Result<&SessionState, SessionError> {
        self.apply(SessionEvent::Start {
            files: self.files.len(),
            mode: self.mode,
        })?;
        if !self.is_busy() {
            return Ok(&self.state);
        }

        let mut config = config.clone();
        config.mode = self.mode;
        info!("Session run started: {} file(s), {} mode", self.files.len(), self.mode);

        let event = match analyze_with(&self.files, analyzer, &config).await {
            Ok(output) => SessionEvent::Complete(Box::new(output)),
            Err(e) => {
                error!("Analysis run failed: {}", e);
                SessionEvent::Fail {
                    message: GENERIC_FAILURE_MESSAGE.to_string(),
                }
            }
        };
        self.apply(event)?;
        Ok(&self.state)
    }
}
