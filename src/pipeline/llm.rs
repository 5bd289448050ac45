//! Outline generation: extracted text → one prompt → one completion.
//!
//! The prompt itself lives in [`crate::prompts`]. The request is a single,
//! non-streaming call with no retry and no fallback model; whatever the
//! service returns (or fails with) ends this stage.
//!
//! The service sits behind [`CompletionService`] so tests and callers can
//! substitute a deterministic stand-in for the network.

use crate::config::{MindmapConfig, DEFAULT_PROVIDER};
use crate::error::{MindmapError, Warning};
use crate::output::{ExtractedText, OutlineDocument};
use crate::prompts::{build_prompt, TRUNCATION_MARKER};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, GeminiProvider, LLMProvider};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Text returned by a completion service, with token accounting when the
/// service reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Capability that turns one prompt into one complete response.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Provider name used in error messages and logs.
    fn provider(&self) -> &str;

    /// Submit `prompt` and wait for the whole response.
    ///
    /// Any failure of the call itself is a [`MindmapError::ServiceError`].
    async fn complete(&self, prompt: &str) -> Result<Completion, MindmapError>;
}

/// What the generator hands back to the pipeline.
#[derive(Debug, Clone)]
pub struct GeneratedOutline {
    pub outline: OutlineDocument,
    pub warnings: Vec<Warning>,
    pub submitted_chars: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

/// Cut `text` to at most `max_chars` characters.
///
/// Text over the cap keeps its first `max_chars` characters and gains
/// [`TRUNCATION_MARKER`]; a [`Warning::LengthTruncated`] is returned with it.
/// Text at or under the cap is borrowed unchanged.
pub fn truncate_text(text: &str, max_chars: usize) -> (Cow<'_, str>, Option<Warning>) {
    match text.char_indices().nth(max_chars) {
        None => (Cow::Borrowed(text), None),
        Some((cut, _)) => {
            let original_chars = max_chars + text[cut..].chars().count();
            let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
            truncated.push_str(&text[..cut]);
            truncated.push_str(TRUNCATION_MARKER);
            (
                Cow::Owned(truncated),
                Some(Warning::LengthTruncated {
                    original_chars,
                    max_chars,
                }),
            )
        }
    }
}

/// Generate the outline for `text`.
///
/// ## Steps
/// 1. Truncate to `config.max_input_chars` (non-fatal warning).
/// 2. Assemble the prompt.
/// 3. One call to `service`, optionally bounded by `config.api_timeout_secs`.
/// 4. Reject empty or whitespace-only responses as `EmptyGeneration`.
/// 5. Trim and return.
pub async fn generate_outline(
    service: &dyn CompletionService,
    text: &ExtractedText,
    config: &MindmapConfig,
) -> Result<GeneratedOutline, MindmapError> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    let (subject, warning) = truncate_text(text.as_str(), config.max_input_chars);
    if let Some(w) = warning {
        warn!("{}", w);
        if let Some(ref cb) = config.progress_callback {
            cb.on_warning(&w);
        }
        warnings.push(w);
    }
    let submitted_chars = subject.chars().count();

    let prompt = build_prompt(config.instructions.as_deref(), &subject);
    debug!(
        "Prompt for '{}': {} chars ({} chars of text)",
        service.provider(),
        prompt.len(),
        submitted_chars
    );

    let call = service.complete(&prompt);
    let completion = match config.api_timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), call)
            .await
            .map_err(|_| MindmapError::ServiceError {
                provider: service.provider().to_string(),
                detail: format!("no response after {secs}s"),
            })??,
        None => call.await?,
    };

    let outline = OutlineDocument::parse(&completion.text).ok_or_else(|| {
        MindmapError::EmptyGeneration {
            provider: service.provider().to_string(),
        }
    })?;

    let duration = start.elapsed();
    info!(
        "Outline generated by '{}': {} chars, {} in / {} out tokens, {:?}",
        service.provider(),
        outline.as_str().len(),
        completion.input_tokens,
        completion.output_tokens,
        duration
    );

    Ok(GeneratedOutline {
        outline,
        warnings,
        submitted_chars,
        input_tokens: completion.input_tokens,
        output_tokens: completion.output_tokens,
        duration_ms: duration.as_millis() as u64,
    })
}

// ── edgequake-llm adapter ────────────────────────────────────────────────

/// [`CompletionService`] over any `edgequake_llm` provider.
///
/// The prompt is sent as a single user message; the provider reads its own
/// credential (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, …).
pub struct ProviderCompletionService {
    name: String,
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl ProviderCompletionService {
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>, config: &MindmapConfig) -> Self {
        Self {
            name: name.into(),
            provider,
            options: build_options(config),
        }
    }
}

#[async_trait]
impl CompletionService for ProviderCompletionService {
    fn provider(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<Completion, MindmapError> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| MindmapError::ServiceError {
                provider: self.name.clone(),
                detail: e.to_string(),
            })?;

        Ok(Completion {
            text: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

/// The default Gemini service, keyed from `config.api_key`.
///
/// # Errors
/// [`MindmapError::ConfigurationMissing`] when no key is configured.
pub fn gemini_service(config: &MindmapConfig) -> Result<ProviderCompletionService, MindmapError> {
    let key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| MindmapError::ConfigurationMissing {
            provider: DEFAULT_PROVIDER.to_string(),
            hint: "Set GEMINI_API_KEY or pass --api-key.".to_string(),
        })?;
    let provider = GeminiProvider::new(key).with_model(config.effective_model());
    Ok(ProviderCompletionService::new(
        DEFAULT_PROVIDER,
        Arc::new(provider),
        config,
    ))
}

/// Build `CompletionOptions` from the mindmap config.
fn build_options(config: &MindmapConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}
