//! Pipeline stages for PDF-to-mindmap generation.
//!
//! Each submodule implements exactly one transformation step. PDF parsing
//! and text completion sit behind traits.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ render
//! (upload)   (pdfium)   (outline) (Markmap HTML)
//! ```
//!
//! 1. [`input`]: accept an upload, a local path or a URL as PDF bytes
//! 2. [`extract`]: per-page text via pdfium on the blocking pool, then joined
//! 3. [`llm`]: truncate, build the prompt, make the single completion call
//!    (Gemini through edgequake-llm by default)
//! 4. [`render`]: embed the outline in a self-contained interactive page

pub mod extract;
pub mod input;
pub mod llm;
pub mod render;
