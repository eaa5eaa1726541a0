//! Text utilities for stage inputs and outputs.
//!
//! Output cleaning, prompt-input truncation, and key-point extraction. A
//! capability may wrap its answer in a JSON envelope (`{"output": "..."}`);
//! a malformed envelope is never an error — the raw text is used as-is.

use std::sync::OnceLock;

use regex::Regex;

fn blank_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n+").expect("static regex compiles"))
}

/// Normalizes raw capability output.
///
/// Unwraps a `{"output": ...}` envelope when present, trims surrounding
/// whitespace, and collapses runs of blank lines.
pub fn clean_output(raw: &str) -> String {
    let unwrapped = unwrap_envelope(raw);
    blank_line_re()
        .replace_all(unwrapped.trim(), "\n")
        .into_owned()
}

// Structured envelopes are optional; free text that merely looks like JSON
// falls through to the raw path.
fn unwrap_envelope(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(output) = value.get("output").and_then(|v| v.as_str()) {
                return output.to_string();
            }
        }
    }
    raw.to_string()
}

/// Truncates text to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Derives key points from analysis text by splitting on line boundaries and
/// discarding blanks. An all-blank input yields no key points.
pub fn extract_key_points(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
