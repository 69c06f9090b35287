//! Extraction of a typed JSON payload from free-form LLM reply text.
//!
//! Models asked for "JSON only" still wrap replies in prose or code fences
//! often enough that the raw reply cannot be fed to serde directly. The
//! contract here: find the first balanced `{...}` block, parse it, and on
//! failure apply exactly one named cleanup pass (`relax_json`) before
//! giving up.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("reply contains no JSON object")]
    NoJsonObject,

    #[error("failed to parse AI response: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Extracts the first JSON object from `reply` and deserializes it into `T`.
pub fn extract_json<T: DeserializeOwned>(reply: &str) -> Result<T, ExtractError> {
    let block = first_json_block(reply).ok_or(ExtractError::NoJsonObject)?;

    match serde_json::from_str(block) {
        Ok(value) => Ok(value),
        Err(_) => {
            let relaxed = relax_json(block);
            serde_json::from_str(&relaxed).map_err(ExtractError::Parse)
        }
    }
}

/// Returns the first balanced `{...}` block in `text`. String literals and
/// escape sequences are honored so braces inside strings do not affect
/// nesting depth.
fn first_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The single recovery transformation applied when an extracted block fails
/// to parse: raw newlines become spaces and trailing commas before `}` or
/// `]` are dropped. Content inside string literals is left untouched apart
/// from the newline collapse.
pub fn relax_json(block: &str) -> String {
    let collapsed = block.replace(['\n', '\r'], " ");

    let mut out = String::with_capacity(collapsed.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in collapsed.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => {
                out.push(c);
                escaped = true;
            }
            '"' => {
                out.push(c);
                in_string = !in_string;
            }
            '}' | ']' if !in_string => {
                while out.ends_with(' ') {
                    out.pop();
                }
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
        score: f64,
    }

    #[test]
    fn test_extracts_bare_object() {
        let reply = r#"{"name": "Asha", "score": 82.5}"#;
        let payload: Payload = extract_json(reply).unwrap();
        assert_eq!(payload.name, "Asha");
        assert_eq!(payload.score, 82.5);
    }

    #[test]
    fn test_extracts_object_wrapped_in_prose() {
        let reply = "Sure! Here is the analysis you asked for:\n\n{\"name\": \"Asha\", \"score\": 90.0}\n\nLet me know if you need anything else.";
        let payload: Payload = extract_json(reply).unwrap();
        assert_eq!(payload.name, "Asha");
    }

    #[test]
    fn test_extracts_object_inside_code_fence() {
        let reply = "```json\n{\"name\": \"Asha\", \"score\": 77.0}\n```";
        let payload: Payload = extract_json(reply).unwrap();
        assert_eq!(payload.score, 77.0);
    }

    #[test]
    fn test_nested_braces_balance() {
        let reply = r#"{"outer": {"inner": {"deep": 1}}, "tail": 2} trailing prose"#;
        let value: Value = extract_json(reply).unwrap();
        assert_eq!(value["outer"]["inner"]["deep"], 1);
        assert_eq!(value["tail"], 2);
    }

    #[test]
    fn test_braces_inside_strings_do_not_affect_depth() {
        let reply = r#"{"text": "use {curly} braces", "n": 3}"#;
        let value: Value = extract_json(reply).unwrap();
        assert_eq!(value["n"], 3);
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let reply = r#"{"text": "she said \"hi}\" loudly", "n": 4}"#;
        let value: Value = extract_json(reply).unwrap();
        assert_eq!(value["text"], "she said \"hi}\" loudly");
    }

    #[test]
    fn test_trailing_comma_recovered() {
        let reply = r#"{"items": ["a", "b",], "n": 5,}"#;
        let value: Value = extract_json(reply).unwrap();
        assert_eq!(value["items"].as_array().unwrap().len(), 2);
        assert_eq!(value["n"], 5);
    }

    #[test]
    fn test_raw_newline_in_string_recovered() {
        // Illegal raw newline inside a string literal; the cleanup pass
        // collapses it to a space.
        let reply = "{\"text\": \"line one\nline two\"}";
        let value: Value = extract_json(reply).unwrap();
        assert_eq!(value["text"], "line one line two");
    }

    #[test]
    fn test_no_object_is_an_error() {
        let err = extract_json::<Value>("I could not produce JSON, sorry.").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonObject));
    }

    #[test]
    fn test_unrecoverable_block_is_a_parse_error() {
        let err = extract_json::<Value>(r#"{"name": oops}"#).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }

    #[test]
    fn test_relax_json_preserves_commas_inside_strings() {
        let relaxed = relax_json(r#"{"text": "a, b, c",}"#);
        assert_eq!(relaxed, r#"{"text": "a, b, c"}"#);
    }

    #[test]
    fn test_unterminated_object_is_no_object() {
        let err = extract_json::<Value>(r#"{"name": "Asha""#).unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonObject));
    }
}
