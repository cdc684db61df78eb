//! Tool-call normalization over whole model responses.

use proptest::prelude::*;
use vibecheck_core::{
    normalize, BlockParseError, DiagnosticEvent, NormalizeError, RecordingDiagnostics, ToolCall,
};

fn block(literal: &str) -> String {
    format!("<tool_call>\n{literal}\n</tool_call>")
}

fn python_call(name: &str, entries: &[(String, i64)]) -> String {
    let args: Vec<String> = entries
        .iter()
        .map(|(k, v)| format!("'{k}': {v}"))
        .collect();
    format!("{{'name': '{name}', 'arguments': {{{}}}}}", args.join(", "))
}

fn permuted_entries() -> impl Strategy<Value = (Vec<(String, i64)>, Vec<(String, i64)>)> {
    prop::collection::btree_map("[a-z_]{1,8}", -1000i64..1000, 0..8).prop_flat_map(|map| {
        let entries: Vec<(String, i64)> = map.into_iter().collect();
        (Just(entries.clone()).prop_shuffle(), Just(entries).prop_shuffle())
    })
}

proptest! {
    #[test]
    fn argument_key_order_does_not_change_the_set((left, right) in permuted_entries()) {
        let rec = RecordingDiagnostics::new();
        let a = normalize(&block(&python_call("f", &left)), &rec);
        let b = normalize(&block(&python_call("f", &right)), &rec);
        prop_assert!(a.is_ok());
        prop_assert_eq!(a, b);
        prop_assert!(rec.dropped_blocks().is_empty());
    }
}

#[test]
fn nested_argument_key_order_does_not_change_the_set() {
    let rec = RecordingDiagnostics::new();
    let a = normalize(
        &block("{'name': 'book', 'arguments': {'when': {'day': 1, 'month': 2}, 'who': ['a', 'b']}}"),
        &rec,
    );
    let b = normalize(
        &block(r#"{"arguments": {"who": ["a", "b"], "when": {"month": 2, "day": 1}}, "name": "book"}"#),
        &rec,
    );
    assert_eq!(a, b);
}

#[test]
fn prose_before_block_short_circuits() {
    let rec = RecordingDiagnostics::new();
    let with_prose = "hello\n<tool_call>\n{'name':'f','arguments':{}}\n</tool_call>";
    assert_eq!(
        normalize(with_prose, &rec),
        Err(NormalizeError::StrayText { line: 1 })
    );

    let without_prose = "<tool_call>\n{'name':'f','arguments':{}}\n</tool_call>";
    let set = normalize(without_prose, &rec).expect("normalized");
    assert_eq!(
        set.calls(),
        &[ToolCall {
            name: "f".to_string(),
            arguments: "{}".to_string(),
        }]
    );
}

#[test]
fn stray_text_stops_before_later_blocks_are_inspected() {
    let rec = RecordingDiagnostics::new();
    let text = "Sure!\n<tool_call>\nnot a literal\n</tool_call>";
    assert!(normalize(text, &rec).is_err());
    // The malformed block after the prose is never reached.
    assert!(rec.dropped_blocks().is_empty());
}

#[test]
fn malformed_block_is_dropped_and_reported() {
    let rec = RecordingDiagnostics::new();
    let text = format!(
        "{}\n{}",
        block("{'name': 'good', 'arguments': {'x': 1}}"),
        block("{'name': 'bad', 'arguments': {'x': }")
    );
    let set = normalize(&text, &rec).expect("no sentinel");
    assert_eq!(set.names(), vec!["good"]);

    let dropped = rec.dropped_blocks();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].0, "{'name': 'bad', 'arguments': {'x': }");
    assert!(matches!(dropped[0].1, BlockParseError::Unexpected { .. }));
}

#[test]
fn block_missing_keys_is_dropped() {
    let rec = RecordingDiagnostics::new();
    let text = format!(
        "{}\n{}",
        block("{'name': 'only_name'}"),
        block("{'name': 'ok', 'arguments': {}}")
    );
    let set = normalize(&text, &rec).expect("no sentinel");
    assert_eq!(set.names(), vec!["ok"]);
    assert!(matches!(
        rec.events().as_slice(),
        [DiagnosticEvent::BlockDropped {
            error: BlockParseError::MissingKey("arguments"),
            ..
        }]
    ));
}

#[test]
fn calls_are_sorted_by_name() {
    let rec = RecordingDiagnostics::new();
    let text = format!(
        "{}\n{}",
        block("{'name': 'zeta', 'arguments': {}}"),
        block("{'name': 'alpha', 'arguments': {}}")
    );
    let set = normalize(&text, &rec).expect("normalized");
    assert_eq!(set.names(), vec!["alpha", "zeta"]);
}

#[test]
fn empty_input_is_an_empty_set() {
    let rec = RecordingDiagnostics::new();
    let set = normalize("", &rec).expect("normalized");
    assert!(set.is_empty());
    assert!(rec.events().is_empty());
}
