//! Render - display blocks and plain-text trace formatting

use serde_json::Value;
use std::time::Duration;

/// One display block produced while processing a trace record.
///
/// The TUI styles these itself; [`render_plain`] flattens them to text for
/// the one-shot CLI and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceBlock {
    /// A numbered step heading ("Step 3")
    Heading(String),
    /// A titled section inside a step ("Tool response")
    SubHeading(String),
    /// A short status line
    Note(String),
    /// A labelled value
    Field(String, String),
    /// Verbatim code or raw JSON
    Code(String),
    /// Quoted backend text (rationale, tool output, answers)
    Quote(String),
}

/// Flatten blocks to plain text, one block per line (code keeps its own
/// line breaks, indented).
pub fn render_plain(blocks: &[TraceBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            TraceBlock::Heading(text) => {
                out.push_str("== ");
                out.push_str(text);
                out.push_str(" ==\n");
            }
            TraceBlock::SubHeading(text) => {
                out.push_str("-- ");
                out.push_str(text);
                out.push('\n');
            }
            TraceBlock::Note(text) => {
                out.push_str(text);
                out.push('\n');
            }
            TraceBlock::Field(label, value) => {
                out.push_str(label);
                out.push_str(": ");
                out.push_str(value);
                out.push('\n');
            }
            TraceBlock::Code(code) | TraceBlock::Quote(code) => {
                for line in code.lines() {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Format a raw trace entry for display: pretty-printed JSON when the entry
/// is (or parses as) JSON, the text unchanged otherwise. Never fails.
pub fn format_trace_content(raw: &Value) -> String {
    match raw {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(parsed) => pretty(&parsed),
                    Err(_) => s.clone(),
                }
            } else {
                s.clone()
            }
        }
        other => pretty(other),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Truncate to at most `max` characters, appending an ellipsis when text
/// was dropped. Splits on character boundaries, never inside a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push('\u{2026}');
    out
}

/// Format a duration as seconds with one decimal ("2.3s")
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}
