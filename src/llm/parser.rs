//! # Response Parser
//!
//! $$
//! \text{raw} \mapsto \text{strip fences} \mapsto [\,\dots\,] \mapsto \text{JSON array of objects}
//! $$
//!
//! Recovers the candidate array from model output that may be wrapped in a
//! Markdown fence or surrounded by prose. Field-level checks happen in
//! [`crate::portfolio::normalize`].

use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::error::PipelineError;

const FENCE: &str = "```";

/// Untyped record proposed by the model. Expected keys: `stock`, `weight`.
pub type CandidatePosition = Map<String, Value>;

/// Remove a leading fence (with or without a language tag) and a trailing fence.
pub fn strip_code_fences(raw: &str) -> &str {
  let mut s = raw.trim();

  if let Some(rest) = s.strip_prefix(FENCE) {
    let tag_len = rest
      .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+')))
      .unwrap_or(rest.len());
    s = rest[tag_len..].trim_start();
  }

  if let Some(rest) = s.strip_suffix(FENCE) {
    s = rest;
  }

  s.trim()
}

/// Slice from the first `[` to the last `]`, if both exist in that order.
pub fn extract_bracketed(text: &str) -> Option<&str> {
  let start = text.find('[')?;
  let end = text.rfind(']')?;
  (end > start).then(|| &text[start..=end])
}

/// Strict path: `text` must be a JSON array whose elements are all objects.
pub fn parse_strict(text: &str) -> Result<Vec<CandidatePosition>, PipelineError> {
  let value: Value = serde_json::from_str(text)
    .map_err(|e| PipelineError::malformed(format!("invalid JSON: {e}")))?;

  let items = match value {
    Value::Array(items) => items,
    other => {
      return Err(PipelineError::malformed(format!(
        "expected a JSON array, found {}",
        kind(&other)
      )));
    }
  };

  items
    .into_iter()
    .enumerate()
    .map(|(i, item)| match item {
      Value::Object(record) => Ok(record),
      other => Err(PipelineError::malformed(format!(
        "element {i} is {}, expected an object",
        kind(&other)
      ))),
    })
    .collect()
}

/// Recover an array of candidate records from raw model text.
///
/// Strips code fences, then narrows to the outermost bracketed span, then
/// parses strictly. Without brackets the fence-stripped text is parsed as is.
pub fn parse_array(raw: &str) -> Result<Vec<CandidatePosition>, PipelineError> {
  let body = strip_code_fences(raw);
  if body.is_empty() {
    return Err(PipelineError::malformed("empty response"));
  }

  let payload = match extract_bracketed(body) {
    Some(slice) => slice,
    None => body,
  };

  let records = parse_strict(payload)?;
  debug!(records = records.len(), "parsed candidate array");
  Ok(records)
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn is_malformed(result: Result<Vec<CandidatePosition>, PipelineError>) -> bool {
    matches!(result, Err(PipelineError::MalformedResponse { .. }))
  }

  #[test]
  fn parses_fenced_json() {
    let records = parse_array("```json\n[{\"stock\":\"AAPL\",\"weight\":0.5}]\n```").unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["stock"], json!("AAPL"));
    assert_eq!(records[0]["weight"], json!(0.5));
  }

  #[test]
  fn parses_fence_without_language_tag() {
    let records = parse_array("```\n[{\"stock\":\"MSFT\",\"weight\":1}]\n```").unwrap();
    assert_eq!(records[0]["stock"], json!("MSFT"));
  }

  #[test]
  fn extracts_array_from_surrounding_prose() {
    let raw = "Sure! Here is the result: [{\"stock\":\"X\",\"weight\":-1}] Hope that helps.";
    let records = parse_array(raw).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["stock"], json!("X"));
    assert_eq!(records[0]["weight"], json!(-1));
  }

  #[test]
  fn single_object_is_rejected() {
    assert!(is_malformed(parse_array("{\"stock\":\"X\"}")));
  }

  #[test]
  fn prose_without_payload_is_rejected() {
    assert!(is_malformed(parse_array("I cannot pick stocks today.")));
    assert!(is_malformed(parse_array("   ")));
    assert!(is_malformed(parse_array("```json\n```")));
  }

  #[test]
  fn broken_json_inside_brackets_is_rejected() {
    assert!(is_malformed(parse_array("[{\"stock\": \"X\", \"weight\": }]")));
  }

  #[test]
  fn non_object_elements_are_rejected() {
    let err = parse_array("[1, 2, 3]").unwrap_err();
    assert_eq!(
      err,
      PipelineError::MalformedResponse {
        reason: "element 0 is a number, expected an object".to_string()
      }
    );
  }

  #[test]
  fn empty_array_is_valid_at_this_stage() {
    assert!(parse_array("[]").unwrap().is_empty());
  }

  #[test]
  fn strict_path_does_not_recover() {
    assert!(parse_strict("[{\"stock\":\"X\",\"weight\":1}]").is_ok());
    assert!(parse_strict("Result: [{\"stock\":\"X\",\"weight\":1}]").is_err());
    assert!(parse_strict("```json\n[]\n```").is_err());
  }

  #[test]
  fn fence_helpers() {
    assert_eq!(strip_code_fences("```JSON\n[1]\n```"), "[1]");
    assert_eq!(strip_code_fences("  [1]  "), "[1]");
    assert_eq!(extract_bracketed("a [x] b [y] c"), Some("[x] b [y]"));
    assert_eq!(extract_bracketed("] no ["), None);
  }
}
