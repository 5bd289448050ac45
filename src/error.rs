//! Error types for the edgequake-pdf2mindmap library.
//!
//! Three types for three outcomes:
//!
//! * [`MindmapError`] is **fatal** for the current request. The pipeline stops
//!   at the stage that produced it (unparseable PDF, no extractable text,
//!   provider failure, missing API key). Returned as `Err(MindmapError)` from
//!   every top-level entry point.
//!
//! * [`PageError`] is **non-fatal**. A single page could not be read but the
//!   remaining pages still contribute text. Logged and counted, never
//!   propagated.
//!
//! * [`Warning`] is **informational**. The request continues but the user
//!   should know something was lost (e.g. the text was truncated before it
//!   reached the model). Stored in [`crate::output::MindmapOutput::warnings`].

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2mindmap library.
#[derive(Debug, Error)]
pub enum MindmapError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No credential for the completion service; no request can proceed.
    #[error("API key for provider '{provider}' is missing.\n{hint}")]
    ConfigurationMissing { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// The upload was not declared as a PDF.
    #[error("Unsupported upload '{filename}': only PDF files are accepted")]
    UnsupportedUpload { filename: String },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a file path nor a URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The bytes could not be parsed as a PDF at all.
    #[error("Error reading PDF '{name}': {detail}")]
    MalformedDocument { name: String, detail: String },

    /// The PDF parsed, but no page yielded any text.
    #[error(
        "No text could be extracted from the PDF. \
Please ensure it's not scanned or image-based."
    )]
    ExtractionEmpty { total_pages: usize },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install pdfium for your platform, or set PDFIUM_LIB_PATH to the directory\n\
(or file) containing libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Generation errors ─────────────────────────────────────────────────
    /// The call to the completion service failed (network, auth, quota, …).
    #[error("Error generating mindmap via '{provider}': {detail}")]
    ServiceError { provider: String, detail: String },

    /// The service answered, but with no usable text.
    #[error("Received empty response from '{provider}'")]
    EmptyGeneration { provider: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How an error should be presented to the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl MindmapError {
    /// `ExtractionEmpty` is the user's document, not a malfunction, so it is
    /// shown as a warning. Everything else is an error.
    pub fn severity(&self) -> Severity {
        match self {
            MindmapError::ExtractionEmpty { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Short machine-readable kind, used in JSON responses.
    pub fn kind(&self) -> &'static str {
        match self {
            MindmapError::ConfigurationMissing { .. } => "configuration_missing",
            MindmapError::InvalidConfig(_) => "invalid_config",
            MindmapError::UnsupportedUpload { .. } => "unsupported_upload",
            MindmapError::FileNotFound { .. } => "file_not_found",
            MindmapError::PermissionDenied { .. } => "permission_denied",
            MindmapError::InvalidInput { .. } => "invalid_input",
            MindmapError::DownloadFailed { .. } => "download_failed",
            MindmapError::DownloadTimeout { .. } => "download_timeout",
            MindmapError::MalformedDocument { .. } => "malformed_document",
            MindmapError::ExtractionEmpty { .. } => "extraction_empty",
            MindmapError::PdfiumBindingFailed(_) => "pdfium_binding_failed",
            MindmapError::ServiceError { .. } => "service_error",
            MindmapError::EmptyGeneration { .. } => "empty_generation",
            MindmapError::OutputWriteFailed { .. } => "output_write_failed",
            MindmapError::Internal(_) => "internal",
        }
    }
}

/// A non-fatal error for a single page.
///
/// The page is skipped; the other pages still contribute their text.
#[derive(Debug, Clone, Error, Serialize)]
pub enum PageError {
    /// pdfium could not load the page object.
    #[error("Page {page}: could not be loaded: {detail}")]
    LoadFailed { page: usize, detail: String },

    /// The page loaded but its text layer could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextFailed { page: usize, detail: String },
}

/// A non-fatal condition surfaced to the user while processing continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Text exceeded the input cap and was cut before being sent to the model.
    #[error("Text was truncated to {max_chars} characters due to length limitations.")]
    LengthTruncated {
        original_chars: usize,
        max_chars: usize,
    },
}
