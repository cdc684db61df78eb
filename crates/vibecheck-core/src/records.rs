//! Record stream I/O.
//!
//! A record stream is newline-delimited JSON, one
//! `{"messages": [{"role": .., "content": ..}, ..]}` object per line.
//! The source corpus is read in ShareGPT shape, as a JSON array or as
//! JSON lines.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::domain::{ConversationRecord, RawConversation, Result, VibecheckError};

/// Parse a record stream. Blank lines are skipped; line numbers in errors are 1-based.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<ConversationRecord>> {
    parse_lines(reader)
}

/// Read a record stream from disk.
pub fn read_records(path: &Path) -> Result<Vec<ConversationRecord>> {
    let file = std::fs::File::open(path)?;
    parse_records(BufReader::new(file))
}

/// Render records as a record stream, each line newline-terminated.
pub fn render_records(records: &[ConversationRecord]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Write records to `path`, replacing any existing file.
pub fn write_records(path: &Path, records: &[ConversationRecord]) -> Result<()> {
    let rendered = render_records(records)?;
    let mut file = std::fs::File::create(path)?;
    file.write_all(rendered.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Parse source-corpus conversations from a JSON array or JSON lines.
pub fn parse_raw_conversations(content: &str) -> Result<Vec<RawConversation>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content)
            .map_err(|e| VibecheckError::InvalidSource(e.to_string()));
    }
    parse_lines(content.as_bytes())
}

/// Read source-corpus conversations from disk.
pub fn read_raw_conversations(path: &Path) -> Result<Vec<RawConversation>> {
    let content = std::fs::read_to_string(path)?;
    parse_raw_conversations(&content)
}

fn parse_lines<T, R>(reader: R) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    R: BufRead,
{
    let mut items = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).map_err(|e| VibecheckError::InvalidRecord {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Message, Role};

    #[test]
    fn test_parse_skips_blank_lines() {
        let input = "{\"messages\":[{\"role\":\"user\",\"content\":\"hi\"}]}\n\n{\"messages\":[]}\n";
        let records = parse_records(input.as_bytes()).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].messages[0].role, Role::User);
        assert!(records[1].messages.is_empty());
    }

    #[test]
    fn test_parse_reports_line_number() {
        let input = "{\"messages\":[]}\n\nnot json\n";
        match parse_records(input.as_bytes()) {
            Err(VibecheckError::InvalidRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_render_is_one_compact_object_per_line() {
        let records = vec![
            ConversationRecord::new(vec![Message::user("a")]),
            ConversationRecord::new(vec![Message::assistant("b\nc")]),
        ];
        let rendered = render_records(&records).expect("render");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"messages":[{"role":"user","content":"a"}]}"#);
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("records.jsonl");
        let records = vec![ConversationRecord::new(vec![
            Message::system("s"),
            Message::user("u"),
            Message::assistant("a"),
        ])];
        write_records(&path, &records).expect("write");
        assert_eq!(read_records(&path).expect("read"), records);
    }

    #[test]
    fn test_raw_conversations_array_and_lines() {
        let array = r#"[{"conversations":[{"from":"human","value":"hi"}],"id":"x"}]"#;
        let lines = "{\"conversations\":[{\"from\":\"gpt\",\"value\":\"yo\"}]}\n{\"conversations\":[]}\n";

        let from_array = parse_raw_conversations(array).expect("array");
        assert_eq!(from_array.len(), 1);
        assert_eq!(from_array[0].conversations[0].from, "human");

        let from_lines = parse_raw_conversations(lines).expect("lines");
        assert_eq!(from_lines.len(), 2);
        assert_eq!(from_lines[0].conversations[0].value, "yo");
    }

    #[test]
    fn test_raw_conversations_invalid_array() {
        assert!(matches!(
            parse_raw_conversations("[{\"conversations\": 3}]"),
            Err(VibecheckError::InvalidSource(_))
        ));
    }
}
