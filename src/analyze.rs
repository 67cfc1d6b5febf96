//! Batch analysis entry points.
//!
//! A run resolves every input up front (so a missing file or unsupported
//! format fails before any provider call), analyses each file, and then
//! merges. Files may be analysed concurrently, but results are collected in
//! submitted order and the merge only starts once every file has finished,
//! successfully or not.

use crate::config::AnalysisConfig;
use crate::error::{DocMergeError, FileError};
use crate::output::{AnalysisOutput, AnalysisStats, FileReport};
use crate::pipeline::input::{self, UploadedFile};
use crate::pipeline::llm::{AnalyzerError, DocumentAnalyzer, VlmAnalyzer};
use crate::pipeline::merge::{self, MergeInput};
use crate::pipeline::{date, parts, postprocess};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Model used with the Gemini provider when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Model used with any other named provider when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Analyse files or URLs and merge the answers into one document.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(DocMergeError)` only for fatal errors:
/// - empty selection
/// - file not found / permission denied / download failed
/// - unsupported format
/// - provider not configured
///
/// A file whose analysis fails is not an error: it appears in the document
/// as a placeholder and in `output.files` with `error` set.
pub async fn analyze<S: AsRef<str>>(
    inputs: &[S],
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, DocMergeError> {
    if inputs.is_empty() {
        return Err(DocMergeError::NoInputs);
    }
    let mut files = Vec::with_capacity(inputs.len());
    for i in inputs {
        files.push(input::resolve_input(i.as_ref(), config.download_timeout_secs).await?);
    }
    analyze_files(files, config).await
}

/// Analyse files that are already in memory.
pub async fn analyze_files(
    files: Vec<UploadedFile>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, DocMergeError> {
    if files.is_empty() {
        return Err(DocMergeError::NoInputs);
    }
    let provider = resolve_provider(config)?;
    let analyzer: Arc<dyn DocumentAnalyzer> = Arc::new(VlmAnalyzer::new(provider, config));
    analyze_with(&files, analyzer, config).await
}

/// Analyse `files` with an explicit [`DocumentAnalyzer`].
///
/// `config.provider` and friends are ignored; everything else applies.
pub async fn analyze_with(
    files: &[UploadedFile],
    analyzer: Arc<dyn DocumentAnalyzer>,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, DocMergeError> {
    let run_start = Instant::now();
    if files.is_empty() {
        return Err(DocMergeError::NoInputs);
    }
    if let Some(bad) = files.iter().find(|f| !f.is_pdf() && !f.is_image()) {
        return Err(DocMergeError::UnsupportedFormat {
            name: bad.name.clone(),
            detected: bad.mime_type.clone(),
        });
    }

    let total = files.len();
    info!("Analysing {} file(s) in {} mode", total, config.mode);
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total);
    }

    // `buffered` keeps submitted order regardless of completion order.
    let outcomes: Vec<(FileReport, MergeInput)> = stream::iter(
        files
            .iter()
            .enumerate()
            .map(|(i, file)| analyze_one(i + 1, total, file, analyzer.as_ref(), config)),
    )
    .buffered(config.concurrency.max(1))
    .collect()
    .await;

    let (reports, merge_inputs): (Vec<FileReport>, Vec<MergeInput>) = outcomes.into_iter().unzip();

    let merged = merge::merge(&merge_inputs, config.mode);

    let stats = AnalysisStats {
        total_files: total,
        analysed_files: reports.iter().filter(|r| r.error.is_none()).count(),
        failed_files: reports.iter().filter(|r| r.error.is_some()).count(),
        dated_files: reports.iter().filter(|r| r.date.is_some()).count(),
        total_input_tokens: reports.iter().map(|r| r.input_tokens as u64).sum(),
        total_output_tokens: reports.iter().map(|r| r.output_tokens as u64).sum(),
        total_duration_ms: run_start.elapsed().as_millis() as u64,
    };

    info!(
        "Analysis complete: {}/{} file(s), {} dated, {}ms total",
        stats.analysed_files, total, stats.dated_files, stats.total_duration_ms
    );
    if stats.analysed_files == 0 {
        warn!("Every file failed; the document only contains placeholders");
    }
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(total, stats.analysed_files);
    }

    Ok(AnalysisOutput {
        markdown: merged.markdown,
        has_table: merged.has_table,
        mode: config.mode,
        files: reports,
        stats,
    })
}

/// Analyse and write the merged Markdown to `output_path`.
///
/// Uses an atomic write (temp file in the target directory + persist) to
/// prevent partial files.
pub async fn analyze_to_file<S: AsRef<str>>(
    inputs: &[S],
    output_path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisStats, DocMergeError> {
    let output = analyze(inputs, config).await?;
    write_atomic(output_path.as_ref(), &output.markdown).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync<S: AsRef<str>>(
    inputs: &[S],
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, DocMergeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocMergeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(inputs, config))
}

/// Write `contents` to `path` through a sibling temp file.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), DocMergeError> {
    let write_err = |e: std::io::Error| DocMergeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await.map_err(write_err)?;

    let target = path.to_path_buf();
    let contents = contents.to_string();
    tokio::task::spawn_blocking(move || {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok::<(), std::io::Error>(())
    })
    .await
    .map_err(|e| DocMergeError::Internal(format!("write task panicked: {}", e)))?
    .map_err(write_err)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Convert, analyse and date one file. Never fails: any problem becomes a
/// [`FileError`] the merge renders as a placeholder.
async fn analyze_one(
    index: usize,
    total: usize,
    file: &UploadedFile,
    analyzer: &dyn DocumentAnalyzer,
    config: &AnalysisConfig,
) -> (FileReport, MergeInput) {
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_file_start(index, total, &file.name);
    }

    let mut report = FileReport {
        index,
        name: file.name.clone(),
        parts: 0,
        date: None,
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: 0,
        error: None,
    };

    let outcome = async {
        let file_parts =
            parts::to_parts(file, config.max_rendered_pixels, config.password.as_deref()).await?;
        report.parts = file_parts.len();

        let raw = analyzer
            .analyze(&file_parts, config.mode)
            .await
            .map_err(|e| match e {
                AnalyzerError::Empty => FileError::EmptyResponse {
                    file: file.name.clone(),
                },
                AnalyzerError::Provider(detail) => FileError::AnalysisFailed {
                    file: file.name.clone(),
                    detail,
                },
            })?;
        report.input_tokens = raw.input_tokens;
        report.output_tokens = raw.output_tokens;

        let cleaned = postprocess::normalise_response(&raw.text);
        if cleaned.trim().is_empty() {
            return Err(FileError::EmptyResponse {
                file: file.name.clone(),
            });
        }
        Ok::<_, FileError>(date::extract(&cleaned))
    }
    .await;

    report.duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            debug!(
                "{}: {} part(s), date {:?}, {} chars",
                file.name,
                report.parts,
                result.date,
                result.content.len()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_complete(index, total, &file.name, result.content.len());
            }
            report.date = result.date;
            (report, MergeInput::ok(file.name.clone(), result))
        }
        Err(e) => {
            warn!("{}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_error(index, total, &file.name, &e.to_string());
            }
            report.error = Some(e.clone());
            (report, MergeInput::failed(file.name.clone(), e))
        }
    }
}

fn default_model_for(provider_name: &str) -> &'static str {
    if provider_name.eq_ignore_ascii_case("gemini") {
        DEFAULT_GEMINI_MODEL
    } else {
        DEFAULT_MODEL
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, DocMergeError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DocMergeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    both set and non-empty.
/// 4. **Gemini** when `GEMINI_API_KEY` is set, the service these prompts
///    were written for.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, DocMergeError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(default_model_for(name));
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
            return create_vision_provider("gemini", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocMergeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
