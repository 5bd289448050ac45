//! Request-scoped data produced by the pipeline.
//!
//! Every value here lives for exactly one request. Nothing is cached or
//! shared; a [`MindmapOutput`] is handed to the caller and dropped with it.

use crate::error::Warning;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// File name of the downloadable outline.
pub const DOWNLOAD_FILE_NAME: &str = "mindmap.md";

/// Media type of the downloadable outline.
pub const DOWNLOAD_MEDIA_TYPE: &str = "text/markdown";

/// Trimmed, non-empty text extracted from a PDF, in page order.
///
/// Only [`crate::pipeline::extract::assemble_pages`] constructs this, which
/// guarantees it is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    text: String,
    pages_with_text: usize,
    total_pages: usize,
}

impl ExtractedText {
    pub(crate) fn new(text: String, pages_with_text: usize, total_pages: usize) -> Self {
        debug_assert!(!text.trim().is_empty());
        Self {
            text,
            pages_with_text,
            total_pages,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters (Unicode scalar values), the unit of the input cap.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn pages_with_text(&self) -> usize {
        self.pages_with_text
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }
}

/// A generated outline: trimmed, non-blank heading markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutlineDocument(String);

impl OutlineDocument {
    /// Trim `raw` and wrap it; `None` when nothing but whitespace remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn stats(&self) -> OutlineStats {
        OutlineStats::from_markdown(&self.0)
    }
}

impl fmt::Display for OutlineDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The self-contained HTML document that draws the mindmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderableView {
    /// Complete HTML page, ready for an iframe `srcdoc` or a file.
    pub html: String,
    /// Height of the hosting frame in pixels.
    pub frame_height: u32,
}

/// The raw outline as a downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadArtifact {
    pub file_name: &'static str,
    pub media_type: &'static str,
    pub content: String,
}

impl DownloadArtifact {
    pub fn for_outline(outline: &OutlineDocument) -> Self {
        Self {
            file_name: DOWNLOAD_FILE_NAME,
            media_type: DOWNLOAD_MEDIA_TYPE,
            content: outline.as_str().to_string(),
        }
    }
}

/// Heading and bullet counts of an outline. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutlineStats {
    pub main_topics: usize,
    pub subtopics: usize,
    pub details: usize,
    pub key_points: usize,
}

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+\S").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+]\s+\S").unwrap());

impl OutlineStats {
    pub fn from_markdown(md: &str) -> Self {
        let mut stats = Self::default();
        for line in md.lines() {
            if let Some(caps) = RE_HEADING.captures(line) {
                match caps[1].len() {
                    1 => stats.main_topics += 1,
                    2 => stats.subtopics += 1,
                    _ => stats.details += 1,
                }
            } else if RE_BULLET.is_match(line) {
                stats.key_points += 1;
            }
        }
        stats
    }

    pub fn nodes(&self) -> usize {
        self.main_topics + self.subtopics + self.details + self.key_points
    }
}

/// Numbers describing one run, shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MindmapStats {
    pub total_pages: usize,
    pub pages_with_text: usize,
    /// Characters extracted from the PDF.
    pub extracted_chars: usize,
    /// Characters sent to the model (after truncation, marker included).
    pub submitted_chars: usize,
    pub truncated: bool,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub extract_duration_ms: u64,
    pub generate_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything one successful run produces.
#[derive(Debug, Clone, Serialize)]
pub struct MindmapOutput {
    pub outline: OutlineDocument,
    pub view: RenderableView,
    pub warnings: Vec<Warning>,
    pub stats: MindmapStats,
    pub outline_stats: OutlineStats,
}

impl MindmapOutput {
    /// The outline as `mindmap.md`.
    pub fn download(&self) -> DownloadArtifact {
        DownloadArtifact::for_outline(&self.outline)
    }
}
