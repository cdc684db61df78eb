//! Tool-call normalization.
//!
//! Turns one free-form response into a [`ToolCallSet`]: the tool calls
//! found between `<tool_call>` / `</tool_call>` marker lines, with
//! canonical argument text, sorted by name.
//!
//! Two failure modes are handled differently:
//! - non-blank text outside a block aborts the whole response with
//!   [`NormalizeError::StrayText`];
//! - a block whose payload does not parse is reported to the
//!   [`DiagnosticSink`] and dropped, and normalization continues.

pub mod canonical;
pub mod literal;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::obs::DiagnosticSink;

pub use canonical::canonical_json;
pub use literal::{parse_literal, BlockParseError};

/// Line prefix that opens a tool-call block.
pub const OPEN_MARKER: &str = "<tool_call>";

/// Line suffix that closes a tool-call block.
pub const CLOSE_MARKER: &str = "</tool_call>";

/// A normalized tool call.
///
/// Two calls are equal iff both the name and the canonical argument text are equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ToolCall {
    pub name: String,
    /// Arguments serialized with sorted keys (see [`canonical_json`]).
    pub arguments: String,
}

/// Tool calls of one response, sorted by name (stable for equal names).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ToolCallSet(Vec<ToolCall>);

impl ToolCallSet {
    fn from_unsorted(mut calls: Vec<ToolCall>) -> Self {
        calls.sort_by(|a, b| a.name.cmp(&b.name));
        Self(calls)
    }

    pub fn calls(&self) -> &[ToolCall] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Sentinel replacing a [`ToolCallSet`] when a response cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    #[error("Found generated text outside of a tool call")]
    StrayText {
        /// 1-based line of the first stray text, after trimming the response.
        line: usize,
    },
}

/// Outcome of normalizing one response.
pub type Normalized = std::result::Result<ToolCallSet, NormalizeError>;

/// Normalize one response text into its tool-call set.
pub fn normalize(response: &str, diagnostics: &dyn DiagnosticSink) -> Normalized {
    let mut calls = Vec::new();
    // Lines since the last opening marker. A closing marker does not clear
    // them, so a repeated closing marker parses the same block again.
    let mut block: Vec<&str> = Vec::new();
    let mut inside = false;

    for (idx, line) in response.trim().lines().enumerate() {
        if line.starts_with(OPEN_MARKER) {
            inside = true;
            block.clear();
        } else if line.ends_with(CLOSE_MARKER) {
            let content = block.concat();
            let content = content.trim();
            match parse_tool_call(content) {
                Ok(call) => calls.push(call),
                Err(err) => diagnostics.block_dropped(content, &err),
            }
            inside = false;
        } else if !inside && !line.trim().is_empty() {
            return Err(NormalizeError::StrayText { line: idx + 1 });
        } else {
            block.push(line);
        }
    }

    Ok(ToolCallSet::from_unsorted(calls))
}

/// Parse a block payload of shape `{name: str, arguments: mapping}`.
///
/// Keys other than `name` and `arguments` are ignored.
pub fn parse_tool_call(content: &str) -> std::result::Result<ToolCall, BlockParseError> {
    let Value::Object(mut call) = parse_literal(content)? else {
        return Err(BlockParseError::NotAMapping);
    };

    let name = match call.remove("name") {
        Some(Value::String(name)) => name,
        Some(_) => {
            return Err(BlockParseError::WrongType {
                key: "name",
                expected: "a string",
            })
        }
        None => return Err(BlockParseError::MissingKey("name")),
    };

    let arguments = match call.get("arguments") {
        Some(args @ Value::Object(_)) => canonical_json(args),
        Some(_) => {
            return Err(BlockParseError::WrongType {
                key: "arguments",
                expected: "a mapping",
            })
        }
        None => return Err(BlockParseError::MissingKey("arguments")),
    };

    Ok(ToolCall { name, arguments })
}

/// JSON view of a normalization outcome for logs and artifacts.
///
/// A set renders as a list of `{name, arguments}` objects, the sentinel as
/// `[{"error": "<message>"}]`.
pub fn normalized_to_json(normalized: &Normalized) -> Value {
    match normalized {
        Ok(set) => Value::Array(
            set.calls()
                .iter()
                .map(|c| json!({"name": c.name, "arguments": c.arguments}))
                .collect(),
        ),
        Err(err) => json!([{ "error": err.to_string() }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obs::RecordingDiagnostics;

    fn norm(text: &str) -> Normalized {
        normalize(text, &RecordingDiagnostics::new())
    }

    #[test]
    fn test_empty_input_is_empty_set() {
        assert_eq!(norm(""), Ok(ToolCallSet::default()));
        assert_eq!(norm("  \n\n  "), Ok(ToolCallSet::default()));
    }

    #[test]
    fn test_single_block() {
        let set = norm("<tool_call>\n{'name': 'f', 'arguments': {'x': 1}}\n</tool_call>")
            .expect("normalized");
        assert_eq!(
            set.calls(),
            &[ToolCall {
                name: "f".to_string(),
                arguments: r#"{"x": 1}"#.to_string(),
            }]
        );
    }

    #[test]
    fn test_multiline_block_is_joined_without_newlines() {
        let text = "<tool_call>\n{'name': 'f',\n 'arguments': {'q': 'a b'}}\n</tool_call>";
        let set = norm(text).expect("normalized");
        assert_eq!(set.calls()[0].arguments, r#"{"q": "a b"}"#);
    }

    #[test]
    fn test_blank_lines_between_blocks_are_ignored() {
        let text = "<tool_call>\n{'name': 'a', 'arguments': {}}\n</tool_call>\n\n   \n<tool_call>\n{'name': 'b', 'arguments': {}}\n</tool_call>";
        assert_eq!(norm(text).expect("normalized").names(), vec!["a", "b"]);
    }

    #[test]
    fn test_stray_text_after_block() {
        let text = "<tool_call>\n{'name': 'f', 'arguments': {}}\n</tool_call>\nDone!";
        assert_eq!(norm(text), Err(NormalizeError::StrayText { line: 4 }));
    }

    #[test]
    fn test_stray_text_message() {
        let err = norm("hello").expect_err("stray");
        assert_eq!(err.to_string(), "Found generated text outside of a tool call");
    }

    #[test]
    fn test_marker_line_residue_is_discarded() {
        let text = "<tool_call> opening chatter\n{'name': 'f', 'arguments': {}}\nclosing chatter </tool_call>";
        assert_eq!(norm(text).expect("normalized").names(), vec!["f"]);
    }

    #[test]
    fn test_reopened_block_discards_partial_content() {
        let text = "<tool_call>\n{'name': 'broken',\n<tool_call>\n{'name': 'f', 'arguments': {}}\n</tool_call>";
        assert_eq!(norm(text).expect("normalized").names(), vec!["f"]);
    }

    #[test]
    fn test_unclosed_block_is_discarded() {
        let text = "<tool_call>\n{'name': 'f', 'arguments': {}}\n</tool_call>\n<tool_call>\n{'name': 'g', 'arguments': {}}";
        assert_eq!(norm(text).expect("normalized").names(), vec!["f"]);
    }

    #[test]
    fn test_unopened_close_marker_drops_empty_block() {
        let sink = RecordingDiagnostics::new();
        let set = normalize("</tool_call>", &sink).expect("normalized");
        assert!(set.is_empty());
        assert_eq!(sink.dropped_blocks().len(), 1);
    }

    #[test]
    fn test_repeated_close_marker_parses_the_block_again() {
        let text = "<tool_call>\n{'name': 'f', 'arguments': {'x': 1}}\n</tool_call>\n</tool_call>";
        let set = norm(text).expect("normalized");
        assert_eq!(set.names(), vec!["f", "f"]);
        assert_eq!(set.calls()[0], set.calls()[1]);

        let sink = RecordingDiagnostics::new();
        let once = "<tool_call>\n{'name': 'f', 'arguments': {}}\n</tool_call>";
        let twice = format!("{once}\n</tool_call>");
        assert_ne!(normalize(once, &sink), normalize(&twice, &sink));
        assert!(sink.dropped_blocks().is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "<tool_call>\r\n{'name': 'f', 'arguments': {}}\r\n</tool_call>\r\n";
        assert_eq!(norm(text).expect("normalized").names(), vec!["f"]);
    }

    #[test]
    fn test_equal_names_keep_authoring_order() {
        let text = "<tool_call>\n{'name': 'f', 'arguments': {'i': 2}}\n</tool_call>\n<tool_call>\n{'name': 'f', 'arguments': {'i': 1}}\n</tool_call>";
        let set = norm(text).expect("normalized");
        assert_eq!(set.calls()[0].arguments, r#"{"i": 2}"#);
        assert_eq!(set.calls()[1].arguments, r#"{"i": 1}"#);
    }

    #[test]
    fn test_parse_tool_call_shape_errors() {
        assert_eq!(
            parse_tool_call("[1, 2]"),
            Err(BlockParseError::NotAMapping)
        );
        assert_eq!(
            parse_tool_call("{'arguments': {}}"),
            Err(BlockParseError::MissingKey("name"))
        );
        assert_eq!(
            parse_tool_call("{'name': 'f'}"),
            Err(BlockParseError::MissingKey("arguments"))
        );
        assert_eq!(
            parse_tool_call("{'name': 3, 'arguments': {}}"),
            Err(BlockParseError::WrongType {
                key: "name",
                expected: "a string"
            })
        );
        assert_eq!(
            parse_tool_call("{'name': 'f', 'arguments': 'x=1'}"),
            Err(BlockParseError::WrongType {
                key: "arguments",
                expected: "a mapping"
            })
        );
    }

    #[test]
    fn test_parse_tool_call_ignores_extra_keys() {
        let call = parse_tool_call("{'id': 7, 'name': 'f', 'arguments': {}}").expect("parse");
        assert_eq!(call.name, "f");
        assert_eq!(call.arguments, "{}");
    }

    #[test]
    fn test_normalized_to_json() {
        let ok = norm("<tool_call>\n{'name': 'f', 'arguments': {'b': 1, 'a': 2}}\n</tool_call>");
        assert_eq!(
            normalized_to_json(&ok),
            json!([{"name": "f", "arguments": "{\"a\": 2, \"b\": 1}"}])
        );

        let err = norm("prose");
        assert_eq!(
            normalized_to_json(&err),
            json!([{"error": "Found generated text outside of a tool call"}])
        );
    }
}
