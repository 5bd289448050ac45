//! # edgequake-pdf2mindmap
//!
//! Turn a PDF into an interactive mindmap.
//!
//! The text layer of the PDF is extracted with pdfium, summarised by an LLM
//! into a heading outline (`#` main topics, `##` subtopics, `###` details,
//! `- ` key points), and embedded in a self-contained HTML page that draws it
//! with [Markmap](https://markmap.js.org). The outline itself is offered as
//! `mindmap.md`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     upload, local file or URL
//!  ├─ 2. Extract   page text via pdfium (spawn_blocking), joined in order
//!  ├─ 3. Generate  truncate to 30 000 chars, one completion call (Gemini by default)
//!  ├─ 4. Render    escape into a Markmap HTML page
//!  └─ 5. Output    outline + view + warnings + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2mindmap::{generate_mindmap, MindmapConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MindmapConfig::builder()
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!     let output = generate_mindmap("document.pdf", &config).await?;
//!     println!("{}", output.outline);
//!     std::fs::write("mindmap.html", &output.view.html)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum web UI ([`server`]) |
//! | `cli`    | on      | the `pdf2mindmap` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable both when using only the library:
//! ```toml
//! edgequake-pdf2mindmap = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{MindmapConfig, MindmapConfigBuilder, ViewOptions};
pub use convert::{
    generate_mindmap, generate_mindmap_from_bytes, generate_mindmap_sync, write_mindmap,
    write_outputs, MindmapPipeline, WrittenFiles,
};
pub use error::{MindmapError, PageError, Severity, Warning};
pub use output::{
    DownloadArtifact, ExtractedText, MindmapOutput, MindmapStats, OutlineDocument, OutlineStats,
    RenderableView,
};
pub use pipeline::extract::{PageText, PdfiumExtractor, TextExtractor};
pub use pipeline::input::SourceDocument;
pub use pipeline::llm::{Completion, CompletionService};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, PipelineStage, ProgressCallback};
