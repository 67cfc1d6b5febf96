//! VLM interaction: send one file's parts to the provider and return the
//! raw answer.
//!
//! The run talks to the provider through the [`DocumentAnalyzer`] trait so
//! the assembly pipeline can be driven by any backend. [`VlmAnalyzer`] is
//! the production implementation on top of `edgequake-llm`; the prompt
//! text it sends lives in [`crate::prompts`].
//!
//! There is no retry loop and no timeout here. A failed call fails that
//! file only; the merge substitutes a placeholder for it.

use crate::config::{AnalysisConfig, ExtractionMode};
use crate::pipeline::encode::to_image_data;
use crate::pipeline::parts::FilePart;
use crate::prompts::{instruction_for, USER_PREAMBLE};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Raw provider answer for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAnalysis {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl RawAnalysis {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Why an analyzer produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    /// The upstream service returned an error.
    #[error("{0}")]
    Provider(String),

    /// The service answered with no usable text.
    #[error("empty response")]
    Empty,
}

/// Anything that can turn a file's parts into a raw Markdown answer.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, parts: &[FilePart], mode: ExtractionMode) -> Result<RawAnalysis, AnalyzerError>;
}

/// [`DocumentAnalyzer`] backed by an `edgequake-llm` vision provider.
///
/// ## Message Layout
///
/// 1. **System message**: the per-mode instruction (date rule first), or the
///    configured override
/// 2. **User message**: the preamble text plus every part as an image
///    attachment
pub struct VlmAnalyzer {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    system_prompt: Option<String>,
}

impl VlmAnalyzer {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalysisConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            system_prompt: config.system_prompt.clone(),
        }
    }

    fn instruction(&self, mode: ExtractionMode) -> String {
        match &self.system_prompt {
            Some(p) => p.clone(),
            None => instruction_for(mode),
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for VlmAnalyzer {
    async fn analyze(&self, parts: &[FilePart], mode: ExtractionMode) -> Result<RawAnalysis, AnalyzerError> {
        let images = parts.iter().map(to_image_data).collect();
        let messages = vec![
            ChatMessage::system(self.instruction(mode)),
            ChatMessage::user_with_images(USER_PREAMBLE, images),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| AnalyzerError::Provider(e.to_string()))?;

        debug!(
            "{} part(s): {} input tokens, {} output tokens",
            parts.len(),
            response.prompt_tokens,
            response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(AnalyzerError::Empty);
        }

        Ok(RawAnalysis {
            text: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Build `CompletionOptions` from the run config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
