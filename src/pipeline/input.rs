//! Document intake: turn an upload, a local path or a URL into PDF bytes.
//!
//! Intake checks only the *declared* type of an upload (file name or content
//! type). The bytes themselves are judged by the PDF parser in
//! [`super::extract`], which reports `MalformedDocument` for anything it
//! cannot open. Everything is held in memory for the length of one request.

use crate::error::MindmapError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Raw bytes of one PDF plus a display name. Dropped after extraction.
#[derive(Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Accept an uploaded file whose declared type is PDF.
    ///
    /// The declaration holds when the file name ends in `.pdf` or the
    /// content type is `application/pdf`.
    pub fn from_upload(
        filename: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Self, MindmapError> {
        let name = filename.unwrap_or("upload.pdf").to_string();
        if !is_declared_pdf(filename, content_type) {
            return Err(MindmapError::UnsupportedUpload { filename: name });
        }
        debug!("Accepted upload '{}' ({} bytes)", name, bytes.len());
        Ok(Self::new(name, bytes))
    }
}

/// Whether an upload is declared as a PDF.
pub fn is_declared_pdf(filename: Option<&str>, content_type: Option<&str>) -> bool {
    let by_name = filename
        .map(|f| f.to_ascii_lowercase().ends_with(".pdf"))
        .unwrap_or(false);
    let by_type = content_type
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .eq_ignore_ascii_case("application/pdf")
        })
        .unwrap_or(false);
    by_name || by_type
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a CLI-style input (local path or URL) to PDF bytes.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<SourceDocument, MindmapError> {
    if input.trim().is_empty() {
        return Err(MindmapError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Read a local file into memory.
async fn read_local(path_str: &str) -> Result<SourceDocument, MindmapError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => MindmapError::PermissionDenied { path: path.clone() },
        std::io::ErrorKind::NotFound => MindmapError::FileNotFound { path: path.clone() },
        _ => MindmapError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path_str.to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(SourceDocument::new(name, bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<SourceDocument, MindmapError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| MindmapError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            MindmapError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            MindmapError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(MindmapError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MindmapError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(SourceDocument::new(filename_from_url(url), bytes.to_vec()))
}

/// Extract a reasonable display name from a URL.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
