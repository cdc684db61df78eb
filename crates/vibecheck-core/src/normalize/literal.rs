//! Strict reader for the literal payload of a tool-call block.
//!
//! Models write tool calls either as JSON or as Python-style dict literals
//! (`{'name': 'f', 'arguments': {'x': True}}`). This reader accepts the data
//! subset of both: mappings, lists, tuples (read as lists), quoted strings,
//! numbers, and the `True`/`False`/`None` keywords with their JSON
//! spellings. Nothing is evaluated; any other token is rejected.

use serde_json::{Map, Number, Value};

/// Maximum nesting depth of containers inside one block.
pub const MAX_DEPTH: usize = 64;

/// Why one tool-call block could not be turned into a tool call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockParseError {
    #[error("empty tool call block")]
    Empty,

    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    Unexpected {
        offset: usize,
        found: String,
        expected: &'static str,
    },

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("invalid escape sequence at offset {0}")]
    InvalidEscape(usize),

    #[error("unpaired UTF-16 surrogate escape at offset {0}")]
    LoneSurrogate(usize),

    #[error("invalid number literal {0:?}")]
    InvalidNumber(String),

    #[error("mapping key at offset {0} is not a string")]
    NonStringKey(usize),

    #[error("trailing content at offset {0}")]
    TrailingContent(usize),

    #[error("literal nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("tool call is not a mapping")]
    NotAMapping,

    #[error("tool call is missing key {0:?}")]
    MissingKey(&'static str),

    #[error("tool call key {key:?} must be {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
}

/// Parse one complete literal. Surrounding whitespace is allowed, anything
/// else after the literal is not.
pub fn parse_literal(input: &str) -> Result<Value, BlockParseError> {
    let mut parser = LiteralParser::new(input);
    parser.skip_ws();
    if parser.at_end() {
        return Err(BlockParseError::Empty);
    }
    let value = parser.value(0)?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(BlockParseError::TrailingContent(parser.pos));
    }
    Ok(value)
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, expected: &'static str) -> BlockParseError {
        let found = match self.peek() {
            Some(c) => format!("{c:?}"),
            None => "end of input".to_string(),
        };
        BlockParseError::Unexpected {
            offset: self.pos,
            found,
            expected,
        }
    }

    fn expect(&mut self, want: char, expected: &'static str) -> Result<(), BlockParseError> {
        self.skip_ws();
        if self.peek() == Some(want) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, BlockParseError> {
        if depth > MAX_DEPTH {
            return Err(BlockParseError::TooDeep(MAX_DEPTH));
        }
        self.skip_ws();
        match self.peek() {
            Some('{') => self.mapping(depth),
            Some('[') => {
                let (items, _) = self.sequence(depth, ']')?;
                Ok(Value::Array(items))
            }
            Some('(') => self.tuple(depth),
            Some('\'') | Some('"') => self.string().map(Value::String),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.keyword(),
            _ => Err(self.unexpected("a literal")),
        }
    }

    fn mapping(&mut self, depth: usize) -> Result<Value, BlockParseError> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key_offset = self.pos;
            let key = match self.value(depth + 1)? {
                Value::String(key) => key,
                _ => return Err(BlockParseError::NonStringKey(key_offset)),
            };
            self.expect(':', "':'")?;
            let value = self.value(depth + 1)?;
            // Later duplicates win, as in a dict display.
            map.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
    }

    /// Items up to `close`, plus whether a separating comma was seen.
    fn sequence(&mut self, depth: usize, close: char) -> Result<(Vec<Value>, bool), BlockParseError> {
        self.pos += 1;
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok((items, saw_comma));
            }

            items.push(self.value(depth + 1)?);

            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    saw_comma = true;
                    self.pos += 1;
                }
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok((items, saw_comma));
                }
                _ => return Err(self.unexpected("',' or a closing bracket")),
            }
        }
    }

    fn tuple(&mut self, depth: usize) -> Result<Value, BlockParseError> {
        let (mut items, saw_comma) = self.sequence(depth, ')')?;
        // `(x)` is a parenthesized value, `(x,)` a one-element tuple.
        if items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn string(&mut self) -> Result<String, BlockParseError> {
        let start = self.pos;
        let quote = match self.bump() {
            Some(q) => q,
            None => return Err(self.unexpected("a string")),
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(BlockParseError::UnterminatedString(start)),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => self.escape(&mut out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), BlockParseError> {
        let offset = self.pos - 1;
        let c = self
            .bump()
            .ok_or(BlockParseError::UnterminatedString(offset))?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'v' => out.push('\u{0b}'),
            '\\' | '\'' | '"' => out.push(c),
            'x' => out.push(self.hex_escape(2, offset)?),
            'u' => out.push(self.unicode_escape(offset)?),
            'U' => out.push(self.hex_escape(8, offset)?),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(code).ok_or(BlockParseError::InvalidEscape(offset))?);
            }
            // Unknown escapes keep their backslash.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_code(&mut self, digits: usize, offset: usize) -> Result<u32, BlockParseError> {
        let mut code: u32 = 0;
        for _ in 0..digits {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or(BlockParseError::InvalidEscape(offset))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn hex_escape(&mut self, digits: usize, offset: usize) -> Result<char, BlockParseError> {
        let code = self.hex_code(digits, offset)?;
        char::from_u32(code).ok_or(BlockParseError::InvalidEscape(offset))
    }

    /// `\uXXXX`; a high surrogate must be followed by a `\uXXXX` low surrogate.
    ///
    /// Unpaired surrogates have no `char` and are rejected.
    fn unicode_escape(&mut self, offset: usize) -> Result<char, BlockParseError> {
        let high = self.hex_code(4, offset)?;
        if !(0xD800..=0xDFFF).contains(&high) {
            return char::from_u32(high).ok_or(BlockParseError::InvalidEscape(offset));
        }
        let paired = high < 0xDC00
            && self.peek() == Some('\\')
            && self.chars.get(self.pos + 1) == Some(&'u');
        if !paired {
            return Err(BlockParseError::LoneSurrogate(offset));
        }
        self.pos += 2;
        let low = self.hex_code(4, offset)?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return Err(BlockParseError::LoneSurrogate(offset));
        }
        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(code).ok_or(BlockParseError::InvalidEscape(offset))
    }

    fn number(&mut self) -> Result<Value, BlockParseError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.' || c == '_') {
            self.pos += 1;
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('-') | Some('+')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        // Swallow glued identifier characters so `12abc` fails as a whole.
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        let digits = text.replace('_', "");
        let invalid = || BlockParseError::InvalidNumber(text.clone());

        if digits.contains(['.', 'e', 'E']) {
            let float: f64 = digits.parse().map_err(|_| invalid())?;
            return Number::from_f64(float).map(Value::Number).ok_or_else(invalid);
        }
        if let Ok(int) = digits.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        if let Ok(int) = digits.parse::<u64>() {
            return Ok(Value::Number(int.into()));
        }
        big_integer(&digits).ok_or_else(invalid)
    }

    fn keyword(&mut self) -> Result<Value, BlockParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            _ => {
                self.pos = start;
                Err(self.unexpected("a literal"))
            }
        }
    }
}

/// An integer past 64 bits, kept digit for digit.
fn big_integer(digits: &str) -> Option<Value> {
    let (negative, body) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits.strip_prefix('+').unwrap_or(digits)),
    };
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let body = body.trim_start_matches('0');
    let text = if negative {
        format!("-{body}")
    } else {
        body.to_string()
    };
    serde_json::from_str::<Number>(&text).ok().map(Value::Number)
}
