//! HTML pages served by the web UI.

use crate::error::{MindmapError, Severity};
use crate::output::MindmapOutput;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const INDEX_HTML: &str = include_str!("../../templates/index.html");
const RESULT_HTML: &str = include_str!("../../templates/result.html");
const ERROR_HTML: &str = include_str!("../../templates/error.html");
const STYLES_CSS: &str = include_str!("../../templates/styles.css");

static RE_SLOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{ (\w+) \}\}").unwrap());

/// Fill `{{ name }}` slots in one pass. Substituted values are never
/// rescanned, so user text containing slot syntax stays literal.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    RE_SLOT
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Escape text for an HTML text node or a double-quoted attribute.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// The upload form.
pub fn render_index(model: &str) -> String {
    fill(
        INDEX_HTML,
        &[("styles", STYLES_CSS), ("model", &html_escape(model))],
    )
}

/// The two-tab result page for a finished run.
pub fn render_result(name: &str, output: &MindmapOutput) -> String {
    let warnings = output
        .warnings
        .iter()
        .map(|w| {
            format!(
                "        <p class=\"notice warning\">{}</p>",
                html_escape(&w.to_string())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let s = &output.stats;
    let summary = format!(
        "{} of {} pages had text · {} characters sent to the model · {} in / {} out tokens · {} nodes · {} ms",
        s.pages_with_text,
        s.total_pages,
        s.submitted_chars,
        s.input_tokens,
        s.output_tokens,
        output.outline_stats.nodes(),
        s.total_duration_ms
    );

    fill(
        RESULT_HTML,
        &[
            ("styles", STYLES_CSS),
            ("name", &html_escape(name)),
            ("chars", &s.extracted_chars.to_string()),
            ("warnings", &warnings),
            ("summary", &html_escape(&summary)),
            ("view", &html_escape(&output.view.html)),
            ("frame_height", &output.view.frame_height.to_string()),
            ("markdown", &html_escape(output.outline.as_str())),
        ],
    )
}

/// A failed run, styled by the error's severity.
pub fn render_error(err: &MindmapError) -> String {
    render_message(err.severity(), &err.to_string())
}

/// A plain message page.
pub fn render_message(severity: Severity, message: &str) -> String {
    let class = match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    fill(
        ERROR_HTML,
        &[
            ("styles", STYLES_CSS),
            ("severity", class),
            ("message", &html_escape(message)),
        ],
    )
}
