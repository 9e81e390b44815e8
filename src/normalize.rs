//! Content normalizer
//!
//! Whitespace cleanup and byte-budget enforcement for extraction output.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("blank lines regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("spaces regex"));

/// Collapse runs of 3+ newlines to two and runs of 2+ spaces to one, then trim.
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let text = BLANK_LINES_RE.replace_all(text, "\n\n");
    let text = SPACES_RE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Cut `text` to at most `max_len` bytes on a char boundary.
///
/// The flag is true iff anything was cut.
pub fn truncate_to(text: &str, max_len: usize) -> (&str, bool) {
    if text.len() <= max_len {
        return (text, false);
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}

/// Normalize, then enforce the byte budget
pub fn normalize_within(text: &str, max_len: usize) -> (String, bool) {
    let normalized = normalize(text);
    let (kept, truncated) = truncate_to(&normalized, max_len);
    (kept.to_string(), truncated)
}
