//! Configuration types for PDF-to-mindmap generation.
//!
//! All behaviour is controlled through [`MindmapConfig`], built via its
//! [`MindmapConfigBuilder`]. The configuration is an explicit value handed to
//! [`crate::convert::MindmapPipeline`] at construction; the library never
//! reads the API key from ambient state, so tests can substitute a fake key
//! or a stub service without touching the environment.

use crate::error::MindmapError;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::llm::CompletionService;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_MAX_INPUT_CHARS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Provider used when none is named.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Model used with the default provider when none is named.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Configuration for PDF-to-mindmap generation.
///
/// # Example
/// ```rust
/// use edgequake_pdf2mindmap::MindmapConfig;
///
/// let config = MindmapConfig::builder()
///     .api_key("AIza-test")
///     .model("gemini-2.0-flash")
///     .max_input_chars(20_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct MindmapConfig {
    /// Credential for the completion service. Required for the default
    /// `gemini` provider; other providers read their own key variables.
    pub api_key: Option<String>,

    /// Provider name: "gemini" (default), or any name understood by
    /// `edgequake_llm::ProviderFactory` ("openai", "anthropic", "ollama", …).
    pub provider_name: String,

    /// Model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// Sampling temperature. If None, the service default applies.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate. If None, the service default applies.
    pub max_tokens: Option<usize>,

    /// Characters of extracted text sent to the model. Default: 30 000.
    ///
    /// Longer text is cut to this many characters and suffixed with `...`;
    /// a [`crate::error::Warning::LengthTruncated`] is raised.
    pub max_input_chars: usize,

    /// Replacement for the built-in format instructions. If None, uses
    /// [`crate::prompts::DEFAULT_INSTRUCTIONS`].
    pub instructions: Option<String>,

    /// Optional timeout for the completion call. Default: none.
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Directory or file holding the pdfium shared library. If None, the
    /// system library search path is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Rendering options for the interactive view.
    pub view: ViewOptions,

    /// Receives stage changes and warnings.
    pub progress_callback: Option<ProgressCallback>,

    /// Pre-constructed completion service. Takes precedence over
    /// `provider_name` and `api_key`.
    pub completion_service: Option<Arc<dyn CompletionService>>,

    /// Pre-constructed text extractor. Takes precedence over pdfium.
    pub text_extractor: Option<Arc<dyn TextExtractor>>,
}

impl Default for MindmapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider_name: DEFAULT_PROVIDER.to_string(),
            model: None,
            temperature: None,
            max_tokens: None,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            instructions: None,
            api_timeout_secs: None,
            download_timeout_secs: 120,
            pdfium_lib_path: None,
            view: ViewOptions::default(),
            progress_callback: None,
            completion_service: None,
            text_extractor: None,
        }
    }
}

impl fmt::Debug for MindmapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MindmapConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_input_chars", &self.max_input_chars)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("view", &self.view)
            .field(
                "completion_service",
                &self.completion_service.as_ref().map(|_| "<dyn CompletionService>"),
            )
            .field(
                "text_extractor",
                &self.text_extractor.as_ref().map(|_| "<dyn TextExtractor>"),
            )
            .finish()
    }
}

impl MindmapConfig {
    /// Create a new builder for `MindmapConfig`.
    pub fn builder() -> MindmapConfigBuilder {
        MindmapConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model that will actually be requested.
    pub fn effective_model(&self) -> String {
        match &self.model {
            Some(m) => m.clone(),
            None => default_model_for_provider(&self.provider_name).to_string(),
        }
    }
}

/// Default model per provider, used when `MindmapConfig::model` is None.
pub fn default_model_for_provider(provider: &str) -> &'static str {
    match provider {
        "gemini" => DEFAULT_GEMINI_MODEL,
        "anthropic" => "claude-3-5-haiku-latest",
        "ollama" => "llama3.2",
        "lmstudio" => "local-model",
        _ => "gpt-4.1-nano",
    }
}

/// Builder for [`MindmapConfig`].
pub struct MindmapConfigBuilder {
    config: MindmapConfig,
}

impl MindmapConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.config.api_key = if key.trim().is_empty() { None } else { Some(key) };
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into().to_lowercase();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.config.instructions = Some(text.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn view(mut self, view: ViewOptions) -> Self {
        self.config.view = view;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn completion_service(mut self, service: Arc<dyn CompletionService>) -> Self {
        self.config.completion_service = Some(service);
        self
    }

    pub fn text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.config.text_extractor = Some(extractor);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// A missing API key is *not* a build error: it is reported as
    /// [`MindmapError::ConfigurationMissing`] when the pipeline is created,
    /// because a pre-built `completion_service` needs no key.
    pub fn build(self) -> Result<MindmapConfig, MindmapError> {
        let c = &self.config;
        if c.max_input_chars == 0 {
            return Err(MindmapError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        if c.provider_name.trim().is_empty() {
            return Err(MindmapError::InvalidConfig(
                "provider name must not be empty".into(),
            ));
        }
        c.view.validate()?;
        Ok(self.config)
    }
}

// ── View options ─────────────────────────────────────────────────────────

/// Knobs for the rendered Markmap view.
///
/// Defaults reproduce the classic look: a 4-colour depth cycle, 300 px
/// maximum node width, two levels expanded on load, hosted in a 700 px
/// scrolling frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Node colours, picked by `depth % palette.len()`.
    pub palette: Vec<String>,
    /// Maximum node width in pixels.
    pub max_width: u32,
    /// Horizontal node padding in pixels.
    pub padding_x: u32,
    /// Levels expanded on first render.
    pub initial_expand_level: u32,
    /// Expand/collapse animation length in milliseconds.
    pub duration_ms: u32,
    /// Refit the diagram to the viewport on changes.
    pub auto_fit: bool,
    /// Height of the SVG canvas inside the view, in pixels.
    pub canvas_height: u32,
    /// Height of the embedding frame, in pixels.
    pub view_height: u32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            palette: ["#2196f3", "#4caf50", "#ff9800", "#f44336"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            max_width: 300,
            padding_x: 16,
            initial_expand_level: 2,
            duration_ms: 500,
            auto_fit: true,
            canvas_height: 600,
            view_height: 700,
        }
    }
}

impl ViewOptions {
    fn validate(&self) -> Result<(), MindmapError> {
        if self.palette.is_empty() {
            return Err(MindmapError::InvalidConfig(
                "view palette must contain at least one colour".into(),
            ));
        }
        if self.initial_expand_level == 0 {
            return Err(MindmapError::InvalidConfig(
                "initial_expand_level must be ≥ 1".into(),
            ));
        }
        if self.view_height < 100 {
            return Err(MindmapError::InvalidConfig(format!(
                "view_height must be ≥ 100, got {}",
                self.view_height
            )));
        }
        Ok(())
    }
}
