use serde_json::Value;

/// Fields documented as collections in the model's reply shapes. A model
/// sometimes returns a single object where an array was requested; these
/// get wrapped into a one-element array after a successful parse.
const COLLECTION_FIELDS: &[&str] = &["criticalFiles", "suggestions"];

/// Outcome of trying to recover a JSON value from free-form model text.
/// `Failed` carries the cleaned text so the caller can persist it for
/// diagnosis; extraction itself never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Parsed(Value),
    Failed(String),
}

impl ExtractionResult {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ExtractionResult::Parsed(_))
    }
}

/// Recover a JSON value from model output that may be fenced, wrapped in
/// prose, truncated or otherwise malformed.
///
/// Steps, each tried only if the previous failed: strip code-fence
/// markers, strict-parse the whole text, then strict-parse the longest
/// balanced-brace substring. Anything less yields `Failed`.
pub fn extract(raw_text: &str) -> ExtractionResult {
    let cleaned = strip_code_fences(raw_text);
    let cleaned = cleaned.trim();

    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => return ExtractionResult::Parsed(normalize_collections(value)),
        Err(e) => {
            log::debug!("Full response is not valid JSON ({}), scanning for an embedded object", e);
        }
    }

    if let Some(candidate) = longest_balanced_object(cleaned) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return ExtractionResult::Parsed(normalize_collections(value)),
            Err(e) => {
                log::debug!("Best balanced-brace candidate failed to parse: {}", e);
            }
        }
    } else {
        log::debug!("No balanced-brace candidate found in response");
    }

    ExtractionResult::Failed(cleaned.to_string())
}

/// Remove triple-backtick fence markers (with an optional language tag
/// glued to the opening fence) wherever they occur, leaving the fenced
/// content in place.
fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        // Swallow a language tag such as `json` directly after the fence.
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        rest = &rest[tag_len..];
        if let Some(stripped) = rest.strip_prefix('\n') {
            rest = stripped;
        }
    }
    out.push_str(rest);
    out
}

/// Scan for every substring in which each `{` is matched by a `}` at the
/// same nesting depth, ignoring braces inside JSON string literals, and
/// return the longest one (ties: first occurrence).
fn longest_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut open_stack: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut best: Option<(usize, usize)> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => open_stack.push(i),
            b'}' => {
                if let Some(start) = open_stack.pop() {
                    let len = i + 1 - start;
                    let better = match best {
                        Some((_, best_len)) => len > best_len,
                        None => true,
                    };
                    if better {
                        best = Some((start, len));
                    }
                }
            }
            _ => {}
        }
    }

    best.map(|(start, len)| &text[start..start + len])
}

/// Wrap known collection fields that came back as a bare object into a
/// one-element array.
fn normalize_collections(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        for field in COLLECTION_FIELDS {
            if let Some(entry) = map.get_mut(*field) {
                if entry.is_object() {
                    log::debug!("Normalizing single-object '{}' field into an array", field);
                    let single = entry.take();
                    *entry = Value::Array(vec![single]);
                }
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(result: ExtractionResult) -> Value {
        match result {
            ExtractionResult::Parsed(value) => value,
            ExtractionResult::Failed(raw) => panic!("expected Parsed, got Failed({:?})", raw),
        }
    }

    #[test]
    fn clean_json_parses_directly() {
        assert_eq!(parsed(extract("{\"a\":1}")), json!({"a": 1}));
    }

    #[test]
    fn fenced_json_with_prose_is_recovered() {
        let reply = "Here you go:\n```json\n{\"a\":1}\n```";
        assert_eq!(parsed(extract(reply)), json!({"a": 1}));
    }

    #[test]
    fn fence_without_language_tag_is_stripped() {
        let reply = "```\n{\"ok\":true}\n```";
        assert_eq!(parsed(extract(reply)), json!({"ok": true}));
    }

    #[test]
    fn no_json_at_all_fails_with_cleaned_text() {
        let reply = "no json here at all";
        assert_eq!(
            extract(reply),
            ExtractionResult::Failed("no json here at all".to_string())
        );
    }

    #[test]
    fn longest_balanced_candidate_wins() {
        let reply = "partial {\"a\": 1} and the real one {\"b\": {\"c\": 2}, \"d\": 3} done";
        assert_eq!(parsed(extract(reply)), json!({"b": {"c": 2}, "d": 3}));
    }

    #[test]
    fn braces_inside_string_literals_do_not_break_nesting() {
        let reply = "noise {\"text\": \"a } b { c\", \"n\": 1} noise";
        assert_eq!(parsed(extract(reply)), json!({"text": "a } b { c", "n": 1}));
    }

    #[test]
    fn unclosed_outer_brace_still_recovers_inner_object() {
        let reply = "{ broken start {\"a\": 1}";
        assert_eq!(parsed(extract(reply)), json!({"a": 1}));
    }

    #[test]
    fn truncated_output_fails_not_panics() {
        let reply = "{\"criticalFiles\": [{\"path\": \"src/li";
        assert!(matches!(extract(reply), ExtractionResult::Failed(_)));
    }

    #[test]
    fn single_object_critical_files_is_wrapped_into_array() {
        let reply =
            "{\"criticalFiles\": {\"path\":\"x\",\"reason\":\"y\",\"suggestedImprovements\":\"z\"}}";
        let value = parsed(extract(reply));
        let files = value["criticalFiles"].as_array().expect("array expected");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["path"], "x");
    }

    #[test]
    fn array_valued_collection_fields_are_left_alone() {
        let reply = "{\"suggestions\": [{\"type\":\"organization\"}]}";
        let value = parsed(extract(reply));
        assert_eq!(value["suggestions"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn escaped_quotes_inside_strings_are_handled() {
        let reply = "{\"text\": \"quote \\\" and brace }\"}";
        assert_eq!(
            parsed(extract(reply)),
            json!({"text": "quote \" and brace }"})
        );
    }
}
