//! Pipeline stages and the progress-callback trait.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::MindmapConfigBuilder::progress_callback`] to observe a
//! request as it moves through the pipeline:
//!
//! ```text
//! Idle → AwaitingUpload → Extracting → Generating → Rendering → Done
//!                              │            │            │
//!                              └────────────┴────────────┴──▶ Failed(reason)
//! ```
//!
//! `Done` and `Failed` are terminal. There is no retry edge: a new request
//! starts again at `Idle`.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2mindmap::{MindmapConfig, PipelineProgressCallback, PipelineStage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PipelineProgressCallback for Printer {
//!     fn on_stage(&self, stage: &PipelineStage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = MindmapConfig::builder()
//!     .api_key("test-key")
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::Warning;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where a single request currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "reason", rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    AwaitingUpload,
    Extracting,
    Generating,
    Rendering,
    Done,
    Failed(String),
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed(_))
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: &PipelineStage) -> bool {
        use PipelineStage::*;
        match (self, next) {
            (Done, _) | (Failed(_), _) => false,
            (_, Failed(_)) => true,
            (Idle, AwaitingUpload)
            | (AwaitingUpload, Extracting)
            | (Extracting, Generating)
            | (Generating, Rendering)
            | (Rendering, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Idle => f.write_str("idle"),
            PipelineStage::AwaitingUpload => f.write_str("awaiting upload"),
            PipelineStage::Extracting => f.write_str("extracting text"),
            PipelineStage::Generating => f.write_str("generating outline"),
            PipelineStage::Rendering => f.write_str("rendering mindmap"),
            PipelineStage::Done => f.write_str("done"),
            PipelineStage::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Called by the pipeline as a request progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline may be shared across concurrent HTTP
/// requests, so implementations must be `Send + Sync`.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called on every stage change, including the terminal one.
    fn on_stage(&self, stage: &PipelineStage) {
        let _ = stage;
    }

    /// Called once text extraction succeeds.
    ///
    /// # Arguments
    /// * `chars`: characters of extracted text
    /// * `pages_with_text`: pages that contributed text
    /// * `total_pages`: pages in the document
    fn on_text_extracted(&self, chars: usize, pages_with_text: usize, total_pages: usize) {
        let _ = (chars, pages_with_text, total_pages);
    }

    /// Called for every non-fatal warning, as soon as it is raised.
    fn on_warning(&self, warning: &Warning) {
        let _ = warning;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::MindmapConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
