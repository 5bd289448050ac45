//! End-to-end generation: PDF bytes → outline → interactive view.
//!
//! [`MindmapPipeline`] holds the two capabilities a request needs (a
//! [`TextExtractor`] and a [`CompletionService`]) and is cheap to share:
//! the web server builds one at startup and runs every upload through it.
//! The free functions below build a pipeline per call for one-shot use.
//!
//! Each request runs the stages strictly in order and stops at the first
//! fatal error; there is no partial result and nothing is kept afterwards.

use crate::config::{MindmapConfig, DEFAULT_PROVIDER};
use crate::error::MindmapError;
use crate::output::{MindmapOutput, MindmapStats, DOWNLOAD_FILE_NAME};
use crate::pipeline::extract::{self, TextExtractor};
use crate::pipeline::input::{self, SourceDocument};
use crate::pipeline::llm::{self, CompletionService, ProviderCompletionService};
use crate::pipeline::render;
use crate::progress::PipelineStage;
use edgequake_llm::ProviderFactory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// File name of the rendered view written by [`write_outputs`].
pub const VIEW_FILE_NAME: &str = "mindmap.html";

/// A configured extract → generate → render pipeline.
#[derive(Clone)]
pub struct MindmapPipeline {
    config: MindmapConfig,
    extractor: Arc<dyn TextExtractor>,
    service: Arc<dyn CompletionService>,
}

impl std::fmt::Debug for MindmapPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MindmapPipeline")
            .field("config", &self.config)
            .field("service", &self.service.provider())
            .finish_non_exhaustive()
    }
}

impl MindmapPipeline {
    /// Resolve both capabilities from `config`.
    ///
    /// # Errors
    /// * [`MindmapError::ConfigurationMissing`] when the completion service
    ///   has no credential. Nothing can be generated, so callers should
    ///   report this before accepting any upload.
    /// * [`MindmapError::PdfiumBindingFailed`] when pdfium cannot be loaded.
    pub fn from_config(config: MindmapConfig) -> Result<Self, MindmapError> {
        let service = resolve_service(&config)?;
        let extractor = resolve_extractor(&config)?;
        info!(
            "Pipeline ready: provider '{}', model '{}'",
            service.provider(),
            config.effective_model()
        );
        Ok(Self::new(config, extractor, service))
    }

    /// Assemble a pipeline from explicit parts.
    pub fn new(
        config: MindmapConfig,
        extractor: Arc<dyn TextExtractor>,
        service: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            config,
            extractor,
            service,
        }
    }

    pub fn config(&self) -> &MindmapConfig {
        &self.config
    }

    /// Name of the completion provider in use.
    pub fn provider(&self) -> &str {
        self.service.provider()
    }

    /// Run one document through every stage.
    ///
    /// Reports each stage change to the progress callback; the last one
    /// reported is always `Done` or `Failed`.
    pub async fn run(&self, document: SourceDocument) -> Result<MindmapOutput, MindmapError> {
        let result = self.run_stages(document).await;
        match &result {
            Ok(_) => self.report(PipelineStage::Done),
            Err(e) => {
                warn!("Mindmap generation failed: {}", e);
                self.report(PipelineStage::Failed(e.to_string()));
            }
        }
        result
    }

    async fn run_stages(&self, document: SourceDocument) -> Result<MindmapOutput, MindmapError> {
        let total_start = Instant::now();
        info!("Generating mindmap for '{}' ({} bytes)", document.name, document.bytes.len());

        // ── Step 1: Extract text ─────────────────────────────────────────
        self.report(PipelineStage::Extracting);
        let extract_start = Instant::now();
        let text = extract::extract_text(
            Arc::clone(&self.extractor),
            document.name,
            document.bytes,
        )
        .await?;
        let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_text_extracted(text.char_count(), text.pages_with_text(), text.total_pages());
        }

        // ── Step 2: Generate outline ─────────────────────────────────────
        self.report(PipelineStage::Generating);
        let generated = llm::generate_outline(self.service.as_ref(), &text, &self.config).await?;

        // ── Step 3: Render view ──────────────────────────────────────────
        self.report(PipelineStage::Rendering);
        let view = render::render_view(&generated.outline, &self.config.view);

        let outline_stats = generated.outline.stats();
        let stats = MindmapStats {
            total_pages: text.total_pages(),
            pages_with_text: text.pages_with_text(),
            extracted_chars: text.char_count(),
            submitted_chars: generated.submitted_chars,
            truncated: !generated.warnings.is_empty(),
            input_tokens: generated.input_tokens,
            output_tokens: generated.output_tokens,
            extract_duration_ms,
            generate_duration_ms: generated.duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Mindmap complete: {} nodes, {}ms total",
            outline_stats.nodes(),
            stats.total_duration_ms
        );

        Ok(MindmapOutput {
            outline: generated.outline,
            view,
            warnings: generated.warnings,
            stats,
            outline_stats,
        })
    }

    fn report(&self, stage: PipelineStage) {
        debug!("Stage: {}", stage);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(&stage);
        }
    }
}

/// Generate a mindmap for a local PDF path or an HTTP/HTTPS URL.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2mindmap::{generate_mindmap, MindmapConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MindmapConfig::builder()
///     .api_key(std::env::var("GEMINI_API_KEY")?)
///     .build()?;
/// let output = generate_mindmap("paper.pdf", &config).await?;
/// println!("{}", output.outline);
/// # Ok(())
/// # }
/// ```
pub async fn generate_mindmap(
    input_str: impl AsRef<str>,
    config: &MindmapConfig,
) -> Result<MindmapOutput, MindmapError> {
    let pipeline = MindmapPipeline::from_config(config.clone())?;
    let document = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    pipeline.run(document).await
}

/// Generate a mindmap from PDF bytes already in memory.
///
/// `name` is only used in logs and error messages.
pub async fn generate_mindmap_from_bytes(
    bytes: &[u8],
    name: &str,
    config: &MindmapConfig,
) -> Result<MindmapOutput, MindmapError> {
    let pipeline = MindmapPipeline::from_config(config.clone())?;
    pipeline.run(SourceDocument::new(name, bytes.to_vec())).await
}

/// Synchronous wrapper around [`generate_mindmap`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_mindmap_sync(
    input_str: impl AsRef<str>,
    config: &MindmapConfig,
) -> Result<MindmapOutput, MindmapError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| MindmapError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_mindmap(input_str, config))
}

/// Generate a mindmap and write `mindmap.md` and `mindmap.html` into `dir`.
pub async fn write_mindmap(
    input_str: impl AsRef<str>,
    dir: impl AsRef<Path>,
    config: &MindmapConfig,
) -> Result<(MindmapOutput, WrittenFiles), MindmapError> {
    let output = generate_mindmap(input_str, config).await?;
    let files = write_outputs(&output, dir).await?;
    Ok((output, files))
}

/// Paths written by [`write_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub markdown: PathBuf,
    pub html: PathBuf,
}

/// Write an existing output as `mindmap.md` and `mindmap.html` into `dir`.
///
/// Each file is written to a temporary name and renamed into place, so a
/// reader never sees a partial file.
pub async fn write_outputs(
    output: &MindmapOutput,
    dir: impl AsRef<Path>,
) -> Result<WrittenFiles, MindmapError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| MindmapError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let files = WrittenFiles {
        markdown: dir.join(DOWNLOAD_FILE_NAME),
        html: dir.join(VIEW_FILE_NAME),
    };
    write_atomic(&files.markdown, output.outline.as_str()).await?;
    write_atomic(&files.html, &output.view.html).await?;
    Ok(files)
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), MindmapError> {
    let fail = |e: std::io::Error| MindmapError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Pick the completion service, from most to least specific.
///
/// 1. **Pre-built service** (`config.completion_service`), used as-is.
/// 2. **Gemini** (the default provider), edgequake-llm's `GeminiProvider`
///    keyed from `config.api_key`. A missing key is `ConfigurationMissing`.
/// 3. **Any other named provider** through
///    [`ProviderFactory::create_llm_provider`], which reads that provider's
///    own key variable.
fn resolve_service(config: &MindmapConfig) -> Result<Arc<dyn CompletionService>, MindmapError> {
    if let Some(ref service) = config.completion_service {
        return Ok(Arc::clone(service));
    }

    if config.provider_name == DEFAULT_PROVIDER {
        return Ok(Arc::new(llm::gemini_service(config)?));
    }

    let name = config.provider_name.as_str();
    let model = config.effective_model();
    let provider = ProviderFactory::create_llm_provider(name, &model).map_err(|e| {
        MindmapError::ConfigurationMissing {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderCompletionService::new(name, provider, config)))
}

/// Pick the text extractor: a pre-built one, or the shared pdfium binding.
fn resolve_extractor(config: &MindmapConfig) -> Result<Arc<dyn TextExtractor>, MindmapError> {
    if let Some(ref extractor) = config.text_extractor {
        return Ok(Arc::clone(extractor));
    }
    let pdfium: Arc<dyn TextExtractor> = extract::shared_pdfium(config.pdfium_lib_path.as_deref())?;
    Ok(pdfium)
}
