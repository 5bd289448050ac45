//! View rendering: outline markup → self-contained Markmap HTML page.
//!
//! The outline is embedded verbatim in a JavaScript template literal and
//! turned into a tree in the browser by `markmap-lib`, then drawn with
//! `markmap-view` on top of d3. Nothing is parsed on the server side.
//!
//! ## Escaping
//!
//! [`escape_template_literal`] makes the embedded text decode back to exactly
//! the outline, whatever it contains:
//!
//! | Input | Output | Reason |
//! |-------|--------|--------|
//! | `\`   | `\\`   | would start an escape sequence |
//! | `` ` `` | `` \` `` | would end the literal |
//! | `${`  | `\${`  | would start an interpolation |
//! | `</`  | `<\/`  | would let `</script>` close the script element |
//! | CR    | `\r`   | raw CR and CRLF are read back as LF |
//!
//! Backslashes go first so the later replacements are not doubled.

use crate::config::ViewOptions;
use crate::output::{OutlineDocument, RenderableView};
use tracing::debug;

/// Script sources, loaded in this order.
pub const SCRIPT_SOURCES: [&str; 3] = [
    "https://cdn.jsdelivr.net/npm/d3@6",
    "https://cdn.jsdelivr.net/npm/markmap-view",
    "https://cdn.jsdelivr.net/npm/markmap-lib@0.14.3/dist/browser/index.min.js",
];

/// Shown in place of the diagram when the browser fails to draw it.
pub const RENDER_FAILURE_MESSAGE: &str =
    "Error rendering mindmap. Please check the console for details.";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        #mindmap {
            width: 100%;
            height: {{CANVAS_HEIGHT}}px;
            margin: 0;
            padding: 0;
        }
    </style>
{{SCRIPTS}}
</head>
<body>
    <svg id="mindmap"></svg>
    <script>
        window.onload = async () => {
            try {
                const markdown = `{{MARKDOWN}}`;
                const palette = {{PALETTE}};
                const transformer = new markmap.Transformer();
                const { root } = transformer.transform(markdown);
                const mm = new markmap.Markmap(document.querySelector('#mindmap'), {
                    maxWidth: {{MAX_WIDTH}},
                    color: (node) => palette[node.depth % palette.length],
                    paddingX: {{PADDING_X}},
                    autoFit: {{AUTO_FIT}},
                    initialExpandLevel: {{EXPAND_LEVEL}},
                    duration: {{DURATION}},
                });
                mm.setData(root);
                mm.fit();
            } catch (error) {
                console.error('Error rendering mindmap:', error);
                document.body.innerHTML = '<p style="color: red;">{{FAILURE}}</p>';
            }
        };
    </script>
</body>
</html>
"#;

/// Escape `text` for embedding inside a JavaScript template literal that
/// itself sits inside an HTML `<script>` element.
pub fn escape_template_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
        .replace("</", "<\\/")
        .replace('\r', "\\r")
}

/// Build the interactive view for `outline`.
///
/// Pure: the same outline and options always give the same page.
pub fn render_view(outline: &OutlineDocument, view: &ViewOptions) -> RenderableView {
    let scripts = SCRIPT_SOURCES
        .iter()
        .map(|src| format!("    <script src=\"{src}\"></script>"))
        .collect::<Vec<_>>()
        .join("\n");

    // A JSON array of strings is a valid JS array literal.
    let palette = serde_json::to_string(&view.palette)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/");

    // Markdown last: its text must never be scanned for placeholders.
    let html = TEMPLATE
        .replace("{{CANVAS_HEIGHT}}", &view.canvas_height.to_string())
        .replace("{{SCRIPTS}}", &scripts)
        .replace("{{PALETTE}}", &palette)
        .replace("{{MAX_WIDTH}}", &view.max_width.to_string())
        .replace("{{PADDING_X}}", &view.padding_x.to_string())
        .replace("{{AUTO_FIT}}", if view.auto_fit { "true" } else { "false" })
        .replace("{{EXPAND_LEVEL}}", &view.initial_expand_level.to_string())
        .replace("{{DURATION}}", &view.duration_ms.to_string())
        .replace("{{FAILURE}}", RENDER_FAILURE_MESSAGE)
        .replace("{{MARKDOWN}}", &escape_template_literal(outline.as_str()));

    debug!("Rendered view: {} bytes of HTML", html.len());
    RenderableView {
        html,
        frame_height: view.view_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cooked value of a JS template literal body, for the escapes
    /// [`escape_template_literal`] produces. Panics on anything that would
    /// end the literal or start an interpolation.
    fn decode_template_literal(body: &str) -> String {
        let mut out = String::new();
        let mut chars = body.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(e @ ('\\' | '`' | '$' | '/')) => out.push(e),
                    Some('r') => out.push('\r'),
                    other => panic!("unexpected escape {other:?}"),
                },
                // Line terminators are normalised in the cooked value.
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push('\n');
                }
                '`' => panic!("unescaped backtick ends the literal"),
                '$' if chars.peek() == Some(&'{') => panic!("unescaped interpolation"),
                c => out.push(c),
            }
        }
        out
    }

    fn embedded(html: &str) -> &str {
        let start = html.find("const markdown = `").unwrap() + "const markdown = `".len();
        let end = start + html[start..].find("`;\n").unwrap();
        &html[start..end]
    }

    fn outline(s: &str) -> OutlineDocument {
        OutlineDocument::parse(s).unwrap()
    }

    #[test]
    fn escapes_each_hazard() {
        assert_eq!(escape_template_literal("a`b"), "a\\`b");
        assert_eq!(escape_template_literal("${x}"), "\\${x}");
        assert_eq!(escape_template_literal("$x {y}"), "$x {y}");
        assert_eq!(escape_template_literal("a\\nb"), "a\\\\nb");
        assert_eq!(escape_template_literal("</script>"), "<\\/script>");
        assert_eq!(escape_template_literal("a\r\nb\rc"), "a\\r\nb\\rc");
    }

    #[test]
    fn embedded_markdown_round_trips() {
        let samples = [
            "# Plain\n## Heading",
            "# Code `inline` and ```fenced```",
            "# Price ${amount} and $5 {braces}",
            "# Path C:\\temp\\new and \\` already escaped",
            "# Tag </script><script>alert(1)</script>",
            "# Unicode ✓ — 日本語",
            "# Nested `${`x`}`",
            "# A\r\n## B\r### C",
        ];
        for md in samples {
            let view = render_view(&outline(md), &ViewOptions::default());
            assert_eq!(decode_template_literal(embedded(&view.html)), md, "sample: {md}");
        }
    }

    #[test]
    fn script_element_cannot_be_closed_early() {
        let view = render_view(&outline("# a </script> b"), &ViewOptions::default());
        assert_eq!(view.html.matches("</script>").count(), 4);
    }

    #[test]
    fn libraries_load_in_order() {
        let html = render_view(&outline("# X"), &ViewOptions::default()).html;
        let positions: Vec<usize> = SCRIPT_SOURCES
            .iter()
            .map(|src| html.find(src).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn default_options_match_classic_view() {
        let view = render_view(&outline("# X"), &ViewOptions::default());
        assert_eq!(view.frame_height, 700);
        let html = &view.html;
        assert!(html.contains("height: 600px;"));
        assert!(html.contains("maxWidth: 300,"));
        assert!(html.contains("paddingX: 16,"));
        assert!(html.contains("autoFit: true,"));
        assert!(html.contains("initialExpandLevel: 2,"));
        assert!(html.contains("duration: 500,"));
        assert!(html.contains(r##"const palette = ["#2196f3","#4caf50","#ff9800","#f44336"];"##));
        assert!(html.contains(RENDER_FAILURE_MESSAGE));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn placeholder_text_in_outline_is_left_alone() {
        let md = "# Literal {{MAX_WIDTH}} and {{PALETTE}}";
        let view = render_view(&outline(md), &ViewOptions::default());
        assert_eq!(decode_template_literal(embedded(&view.html)), md);
    }

    #[test]
    fn custom_options_are_applied() {
        let opts = ViewOptions {
            palette: vec!["red".into()],
            initial_expand_level: 4,
            auto_fit: false,
            view_height: 900,
            ..ViewOptions::default()
        };
        let view = render_view(&outline("# X"), &opts);
        assert_eq!(view.frame_height, 900);
        assert!(view.html.contains(r#"const palette = ["red"];"#));
        assert!(view.html.contains("initialExpandLevel: 4,"));
        assert!(view.html.contains("autoFit: false,"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let o = outline("# Same\n## Input");
        let opts = ViewOptions::default();
        assert_eq!(render_view(&o, &opts), render_view(&o, &opts));
    }
}
