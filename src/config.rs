//! Configuration types for a document-analysis run.
//!
//! All run behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks and to log exactly what a run used.
//!
//! The one choice that shapes the output is [`ExtractionMode`]: it selects
//! both the instruction sent to the vision model and the merge policy that
//! assembles the per-file answers.

use crate::error::DocMergeError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for one analysis run over a batch of files.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_docmerge::{AnalysisConfig, ExtractionMode};
///
/// let config = AnalysisConfig::builder()
///     .mode(ExtractionMode::Condensed)
///     .concurrency(2)
///     .model("gemini-2.5-flash")
///     .build()
///     .unwrap();
/// assert!(config.mode.is_tabular());
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Extraction mode for every file in the run. Default: [`ExtractionMode::Standard`].
    pub mode: ExtractionMode,

    /// Number of files analysed concurrently. Default: 4.
    ///
    /// Each file is one independent provider call. Results are collected in
    /// input order and the merge only starts once every file has finished,
    /// so this affects wall-clock time, never the assembled document.
    pub concurrency: usize,

    /// LLM model identifier, e.g. "gemini-2.5-flash", "gpt-4.1".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the LLM completion. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per file. Default: 8192.
    ///
    /// A whole multi-page document is transcribed in one answer in the
    /// narrative modes, so this is larger than a per-page budget.
    pub max_tokens: usize,

    /// Maximum rendered image dimension (width or height) in pixels for PDF
    /// pages. Default: 2000.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system prompt. If None, the built-in instruction for `mode`
    /// is used.
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            concurrency: 4,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 8192,
            max_rendered_pixels: 2000,
            password: None,
            system_prompt: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("mode", &self.mode)
            .field("concurrency", &self.concurrency)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, DocMergeError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(DocMergeError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(DocMergeError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if let Some(ref prompt) = c.system_prompt {
            if prompt.trim().is_empty() {
                return Err(DocMergeError::InvalidConfig(
                    "system prompt override is empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What the vision model is asked to produce for each file, and how the
/// answers are merged.
///
/// | Mode | Answer per file | Merged document |
/// |------|-----------------|-----------------|
/// | `Standard` | full layout-preserving transcription | one section per file |
/// | `StandardNoGrounding` | transcription without citation boilerplate | one section per file |
/// | `Summary` | bullet-point executive summary | one section per file |
/// | `SummaryTable` | one summary table row | six-column table, one row per file |
/// | `Condensed` | one condensed table row | six-column table, one row per file |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMode {
    /// Full transcription preserving layout and tables. (default)
    #[default]
    Standard,
    /// Full transcription, skipping legal-basis and reference preambles.
    StandardNoGrounding,
    /// Bullet-point summary of the key points.
    Summary,
    /// One-row tabular summary per file.
    SummaryTable,
    /// One-row condensed extraction per file.
    Condensed,
}

impl ExtractionMode {
    /// Every mode, in menu order.
    pub const ALL: [ExtractionMode; 5] = [
        ExtractionMode::Standard,
        ExtractionMode::StandardNoGrounding,
        ExtractionMode::Summary,
        ExtractionMode::SummaryTable,
        ExtractionMode::Condensed,
    ];

    /// Tabular modes roll every file up into one row of a shared table.
    pub fn is_tabular(self) -> bool {
        matches!(self, ExtractionMode::SummaryTable | ExtractionMode::Condensed)
    }

    /// Whether the provider is expected to append the table flag when its
    /// answer contains a table (and the merge should strip it).
    pub fn expects_table_flag(self) -> bool {
        !matches!(self, ExtractionMode::Summary)
    }

    /// Tables produced by tabular modes are display-only.
    pub fn tables_editable(self) -> bool {
        !self.is_tabular()
    }

    /// Stable kebab-case name, as used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMode::Standard => "standard",
            ExtractionMode::StandardNoGrounding => "standard-no-grounding",
            ExtractionMode::Summary => "summary",
            ExtractionMode::SummaryTable => "summary-table",
            ExtractionMode::Condensed => "condensed",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExtractionMode {
    type Err = DocMergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        ExtractionMode::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| DocMergeError::InvalidConfig(format!("unknown extraction mode '{s}'")))
    }
}
