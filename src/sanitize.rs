//! Extraction of a JSON object from raw language-model output.
//!
//! Models asked to "return only JSON" routinely wrap it in a markdown
//! fence, add an explanation before or after it, or emit several fragments
//! in a row. [`sanitize`] handles all three:
//!
//! 1. Strip a leading ```` ```json ```` / ```` ``` ```` fence and a trailing
//!    ```` ``` ````.
//! 2. Collect every balanced top-level `{...}` span. Braces inside JSON
//!    string literals are not counted.
//! 3. Parse each span on its own and drop the ones that fail.
//! 4. Shallow-merge the surviving objects in order; later keys win.
//!
//! The result is untyped. Checking it against the filter schema happens
//! afterwards in [`StructuredFilter::from_json`](crate::filter::StructuredFilter::from_json),
//! so a sanitizer failure is always distinguishable from a schema failure.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::FilterError;

/// Extract and merge every JSON object found in `raw`.
///
/// # Errors
///
/// Returns [`FilterError::MalformedResponse`] when no candidate parses as a
/// JSON object.
pub fn sanitize(raw: &str) -> Result<Map<String, Value>, FilterError> {
    let text = strip_code_fence(raw);

    let mut merged = Map::new();
    let mut parsed = 0usize;

    for candidate in brace_spans(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(obj)) => {
                parsed += 1;
                for (key, value) in obj {
                    merged.insert(key, value);
                }
            }
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, fragment = candidate, "discarding unparseable JSON fragment");
            }
        }
    }

    if parsed == 0 {
        return Err(FilterError::MalformedResponse(format!(
            "no valid JSON found in model output: {:?}",
            preview(raw)
        )));
    }

    Ok(merged)
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string (e.g. `json`) on the opening line.
        text = match rest.find('\n') {
            Some(nl) if rest[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[nl + 1..]
            }
            _ => rest.strip_prefix("json").unwrap_or(rest),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Every balanced top-level `{...}` substring of `text`, in order.
fn brace_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    spans
}

fn preview(raw: &str) -> String {
    const MAX_CHARS: usize = 120;
    let mut out: String = raw.chars().take(MAX_CHARS).collect();
    if raw.chars().count() > MAX_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sanitized(raw: &str) -> Value {
        Value::Object(sanitize(raw).unwrap())
    }

    #[test]
    fn test_clean_object_unchanged() {
        let raw = r#"{"name":{"contains":["lamp"]},"quantity":{"gt":2,"lt":9}}"#;
        let expected: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(sanitized(raw), expected);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitized("```json\n{\"price\":{\"lt\":500}}\n```");
        let twice = sanitized(&once.to_string());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_strips_json_fence() {
        assert_eq!(
            sanitized("```json\n{\"price\":{\"lt\":500}}\n```"),
            json!({"price": {"lt": 500}})
        );
    }

    #[test]
    fn test_strips_bare_fence() {
        assert_eq!(
            sanitized("```\n{\"price\":{\"gt\":1}}\n```"),
            json!({"price": {"gt": 1}})
        );
    }

    #[test]
    fn test_strips_inline_fence() {
        assert_eq!(
            sanitized("```json {\"price\":{\"gt\":1}} ```"),
            json!({"price": {"gt": 1}})
        );
    }

    #[test]
    fn test_merges_multiple_fragments() {
        assert_eq!(
            sanitized(r#"{"name":{"contains":["a"]}} garbage {"price":{"lt":10}}"#),
            json!({"name": {"contains": ["a"]}, "price": {"lt": 10}})
        );
    }

    #[test]
    fn test_later_fragment_wins_on_conflict() {
        assert_eq!(
            sanitized(r#"{"price":{"lt":10}} then {"price":{"gt":3}}"#),
            json!({"price": {"gt": 3}})
        );
    }

    #[test]
    fn test_surrounding_prose_ignored() {
        let raw = "Sure! Here is the filter:\n{\"name\":{\"contains\":[\"chair\"]}}\nLet me know if you need more.";
        assert_eq!(sanitized(raw), json!({"name": {"contains": ["chair"]}}));
    }

    #[test]
    fn test_broken_fragment_discarded() {
        let raw = r#"{"name": {"contains": [oops]}} {"price":{"lt":20}}"#;
        assert_eq!(sanitized(raw), json!({"price": {"lt": 20}}));
    }

    #[test]
    fn test_braces_inside_strings_do_not_split() {
        let raw = r#"{"name":{"contains":["a}b{c"]}}"#;
        assert_eq!(sanitized(raw), json!({"name": {"contains": ["a}b{c"]}}));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let raw = r#"{"name":{"contains":["12\" {tv}"]}}"#;
        assert_eq!(sanitized(raw), json!({"name": {"contains": ["12\" {tv}"]}}));
    }

    #[test]
    fn test_no_brace_is_malformed() {
        let err = sanitize("I could not understand the request.").unwrap_err();
        assert!(matches!(err, FilterError::MalformedResponse(_)));
    }

    #[test]
    fn test_only_broken_fragments_is_malformed() {
        let err = sanitize("{not json} {also: not}").unwrap_err();
        assert!(matches!(err, FilterError::MalformedResponse(_)));
    }

    #[test]
    fn test_unbalanced_open_brace_is_malformed() {
        let err = sanitize(r#"{"price": {"lt": 5}"#).unwrap_err();
        assert!(matches!(err, FilterError::MalformedResponse(_)));
    }

    #[test]
    fn test_empty_input_is_malformed() {
        assert!(sanitize("").is_err());
        assert!(sanitize("```json\n```").is_err());
    }

    #[test]
    fn test_empty_object_is_valid() {
        assert_eq!(sanitized("{}"), json!({}));
    }

    #[test]
    fn test_strip_code_fence_plain_text_untouched() {
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }
}
