//! Prompt template for outline generation.
//!
//! The three-level heading convention defined here is the whole contract
//! between the model and the renderer.
//!
//! Callers can replace the instruction block via
//! [`crate::config::MindmapConfig::instructions`]; the subject text and the
//! closing response rule are always appended.

/// Default cap on the number of characters sent to the model.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 30_000;

/// Suffix appended to text cut at the character cap.
pub const TRUNCATION_MARKER: &str = "...";

/// Default instructions describing the outline format.
///
/// Used when `MindmapConfig::instructions` is `None`.
pub const DEFAULT_INSTRUCTIONS: &str = r#"Create a hierarchical markdown mindmap from the following text.
Use proper markdown heading syntax (# for main topics, ## for subtopics, ### for details).
Focus on the main concepts and their relationships.
Include relevant details and connections between ideas.
Keep the structure clean and organized.

Format the output exactly like this example:
# Main Topic
## Subtopic 1
### Detail 1
- Key point 1
- Key point 2
### Detail 2
## Subtopic 2
### Detail 3
### Detail 4"#;

/// Closing rule; the renderer embeds the response as-is, so nothing but
/// markup may come back.
pub const RESPONSE_RULE: &str =
    "Respond only with the markdown mindmap, no additional text.";

/// Assemble the single prompt sent to the completion service.
///
/// `text` is appended verbatim; it is never interpreted as a template.
pub fn build_prompt(instructions: Option<&str>, text: &str) -> String {
    let instructions = instructions.unwrap_or(DEFAULT_INSTRUCTIONS);
    format!("{instructions}\n\nText to analyze: {text}\n\n{RESPONSE_RULE}")
}
