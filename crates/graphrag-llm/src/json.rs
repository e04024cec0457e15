//! JSON recovery from model output.
//!
//! Models asked for JSON frequently wrap it in markdown fences or prose.
//! The cascade here tries progressively looser strategies: direct parse
//! with fence trimming, the first fenced block, the first balanced object,
//! then the first balanced array. Returns `None` only when all fail.

use serde_json::Value;

/// Extract a JSON value from raw model output.
pub fn extract_json(text: &str) -> Option<Value> {
    // Direct parse, tolerating a single surrounding fence.
    let cleaned = text.trim();
    let cleaned = cleaned.strip_prefix("```json").unwrap_or(cleaned);
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned);
    if let Ok(value) = serde_json::from_str(cleaned.trim()) {
        return Some(value);
    }

    // A ```json fence embedded in surrounding prose.
    if let Some(inner) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str(inner.trim()) {
            return Some(value);
        }
    }

    // First balanced object.
    if let Some(span) = balanced_span(text, '{', '}') {
        if let Ok(value) = serde_json::from_str(span) {
            return Some(value);
        }
    }

    // First balanced array.
    if let Some(span) = balanced_span(text, '[', ']') {
        if let Ok(value) = serde_json::from_str(span) {
            return Some(value);
        }
    }

    None
}

/// Contents of the first ```json fenced block, if any.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(&rest[..end])
}

/// The first span delimited by balanced `open`/`close` characters.
///
/// Delimiters inside string literals are not special-cased; model output
/// that nests unbalanced braces in strings falls through to the next
/// strategy or to `None`.
fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;

    for (offset, c) in text[start..].char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(&text[start..start + offset + close.len_utf8()]);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_parses() {
        let value = extract_json(r#"{"title": "T", "rating": 5.0}"#).unwrap();
        assert_eq!(value["title"], "T");
    }

    #[test]
    fn fenced_json_parses() {
        let text = "```json\n{\"title\": \"T\"}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value["title"], "T");
    }

    #[test]
    fn fenced_json_with_prose_parses() {
        let text = "Here is the report you asked for:\n```json\n{\"title\": \"T\"}\n```\nLet me know!";
        let value = extract_json(text).unwrap();
        assert_eq!(value["title"], "T");
    }

    #[test]
    fn embedded_object_parses() {
        let text = "The answer is {\"points\": [{\"score\": 80}]} as computed.";
        let value = extract_json(text).unwrap();
        assert_eq!(value["points"][0]["score"], 80);
    }

    #[test]
    fn embedded_array_parses() {
        let text = "Results: [1, 2, 3] done";
        let value = extract_json(text).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn nested_objects_balance() {
        let text = "x {\"a\": {\"b\": {\"c\": 1}}} y";
        let value = extract_json(text).unwrap();
        assert_eq!(value["a"]["b"]["c"], 1);
    }

    #[test]
    fn garbage_returns_none() {
        assert!(extract_json("no json here at all").is_none());
        assert!(extract_json("{broken").is_none());
    }
}
