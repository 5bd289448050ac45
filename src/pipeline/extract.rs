//! Text extraction: PDF bytes → page-ordered plain text.
//!
//! A [`TextExtractor`] parses the document and reports one result per page;
//! it is the only part that touches pdfium. [`assemble_pages`] applies the
//! joining rules and is pure.
//!
//! pdfium calls are CPU-bound and synchronous, so [`extract_text`] runs them
//! on Tokio's blocking pool.

use crate::error::{MindmapError, PageError};
use crate::output::ExtractedText;
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Per-page outcome of a parse. A failed page never aborts the document.
pub type PageText = Result<String, PageError>;

/// Capability that parses PDF bytes into per-page text.
///
/// Returns `Err(MindmapError::MalformedDocument)` only when the bytes cannot
/// be opened as a PDF at all; individual page failures are reported inside
/// the vector.
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, name: &str, pdf: &[u8]) -> Result<Vec<PageText>, MindmapError>;
}

/// Join per-page text into an [`ExtractedText`].
///
/// Pages that failed, or whose text is blank, are skipped. Each surviving
/// page is followed by `\n` and the whole result is trimmed. An empty result
/// is [`MindmapError::ExtractionEmpty`].
pub fn assemble_pages(pages: Vec<PageText>) -> Result<ExtractedText, MindmapError> {
    let total_pages = pages.len();
    let mut text = String::new();
    let mut pages_with_text = 0;

    for page in pages {
        match page {
            Ok(t) if !t.trim().is_empty() => {
                text.push_str(&t);
                text.push('\n');
                pages_with_text += 1;
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping page: {}", e),
        }
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MindmapError::ExtractionEmpty { total_pages });
    }

    Ok(ExtractedText::new(trimmed.to_string(), pages_with_text, total_pages))
}

/// Run `extractor` on the blocking pool and assemble the result.
pub async fn extract_text(
    extractor: Arc<dyn TextExtractor>,
    name: String,
    bytes: Vec<u8>,
) -> Result<ExtractedText, MindmapError> {
    let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&name, &bytes))
        .await
        .map_err(|e| MindmapError::Internal(format!("Extraction task panicked: {}", e)))??;

    let extracted = assemble_pages(pages)?;
    info!(
        "Extracted {} characters from {}/{} pages",
        extracted.char_count(),
        extracted.pages_with_text(),
        extracted.total_pages()
    );
    Ok(extracted)
}

// ── pdfium implementation ────────────────────────────────────────────────

/// [`TextExtractor`] backed by the pdfium shared library.
///
/// Binding happens once, at construction, so a missing library is reported
/// at startup rather than on the first upload. Dropping it unloads pdfium;
/// pipelines use [`shared_pdfium`] so that never happens under another user.
pub struct PdfiumExtractor {
    pdfium: Pdfium,
}

impl PdfiumExtractor {
    /// Bind to pdfium on the system library search path.
    pub fn new() -> Result<Self, MindmapError> {
        Self::from_bindings(Pdfium::bind_to_system_library())
    }

    /// Bind to pdfium at `path`: either the library file itself or the
    /// directory that contains it.
    pub fn with_library_path(path: impl AsRef<Path>) -> Result<Self, MindmapError> {
        Self::from_bindings(Pdfium::bind_to_library(library_file(path.as_ref())))
    }

    fn from_bindings(
        bindings: Result<Box<dyn PdfiumLibraryBindings>, PdfiumError>,
    ) -> Result<Self, MindmapError> {
        let bindings = bindings.map_err(|e| MindmapError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

static SHARED: OnceCell<Arc<PdfiumExtractor>> = OnceCell::new();

/// The process-wide pdfium extractor, bound on first use.
///
/// pdfium is initialised once per process and torn down when its binding is
/// dropped, so every pipeline shares this one instance. `path` only matters
/// for the first successful call; later calls get the same binding.
pub fn shared_pdfium(path: Option<&Path>) -> Result<Arc<PdfiumExtractor>, MindmapError> {
    SHARED
        .get_or_try_init(|| -> Result<_, MindmapError> {
            let extractor = match path {
                Some(p) => PdfiumExtractor::with_library_path(p)?,
                None => PdfiumExtractor::new()?,
            };
            info!("pdfium bound");
            Ok(Arc::new(extractor))
        })
        .map(Arc::clone)
}

fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract_pages(&self, name: &str, pdf: &[u8]) -> Result<Vec<PageText>, MindmapError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| MindmapError::MalformedDocument {
                name: name.to_string(),
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        debug!("PDF '{}' loaded: {} pages", name, pages.len());

        let results = (0..pages.len())
            .map(|idx| {
                let number = idx as usize + 1;
                let page = pages.get(idx).map_err(|e| PageError::LoadFailed {
                    page: number,
                    detail: format!("{:?}", e),
                })?;
                page.text()
                    .map(|t| t.all())
                    .map_err(|e| PageError::TextFailed {
                        page: number,
                        detail: format!("{:?}", e),
                    })
            })
            .collect();

        Ok(results)
    }
}
