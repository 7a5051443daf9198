//! Recursive-descent JSON parser.
//!
//! Each production consumes from a cursor into the input buffer; the
//! consumed span of a sub-parse is the cursor delta, so byte offsets stay
//! exact across nested, variable-length constructs. Every production first
//! skips leading whitespace (space, tab, newline, carriage return).
//!
//! Parsing is a pure function of the input: the output tree owns all of its
//! storage and shares nothing with the buffer or other parses. On error the
//! first failure wins and any partially built subtree is dropped before the
//! error returns - no half-built handle ever escapes.

use memchr::memchr2;

use crate::error::{ErrorKind, ParseError};
use crate::table::Table;
use crate::value::Value;

/// Default bracket-nesting limit. Deeply nested input fails with
/// [`ErrorKind::NestingTooDeep`] instead of exhausting the call stack.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum bracket nesting depth for arrays and objects.
    pub max_depth: usize,
}

impl ParseOptions {
    /// Default options.
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one JSON value from the start of `input`.
///
/// Trailing bytes after the root value are left unconsumed, not rejected;
/// callers that require whole-buffer consumption should use
/// [`parse_prefix`] and check the consumed length themselves.
pub fn parse(input: &str) -> Result<Value, ParseError> {
    parse_with_options(input, ParseOptions::new())
}

/// [`parse`] with explicit [`ParseOptions`].
pub fn parse_with_options(input: &str, options: ParseOptions) -> Result<Value, ParseError> {
    parse_prefix_with_options(input, options).map(|(value, _)| value)
}

/// Parse one JSON value and return it together with the number of bytes
/// consumed (whitespace and value; trailing content untouched).
pub fn parse_prefix(input: &str) -> Result<(Value, usize), ParseError> {
    parse_prefix_with_options(input, ParseOptions::new())
}

/// [`parse_prefix`] with explicit [`ParseOptions`].
pub fn parse_prefix_with_options(
    input: &str,
    options: ParseOptions,
) -> Result<(Value, usize), ParseError> {
    let mut parser = Parser::new(input, options);
    let value = parser.parse_value()?;
    Ok((value, parser.consumed()))
}

/// Cursor-based recursive-descent parser.
///
/// Independently callable at any valid entry point: `Parser::new` at a
/// sub-slice of a document parses one value and reports how far it got.
pub struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    /// Create a parser over `input`.
    pub fn new(input: &'a str, options: ParseOptions) -> Self {
        Self {
            src: input,
            pos: 0,
            depth: 0,
            options,
        }
    }

    /// Bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Parse one value at the cursor: skip whitespace, dispatch on the
    /// first byte.
    pub fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.fail(ErrorKind::UnexpectedEndOfInput)),
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => self.parse_string().map(Value::String),
            Some(b't') | Some(b'f') => self.parse_bool(),
            Some(b'n') => self.parse_null(),
            Some(b'-') | Some(b'0'..=b'9') => self.parse_number(),
            Some(_) => Err(self.fail(ErrorKind::UnexpectedToken)),
        }
    }

    // ---- productions -----------------------------------------------------

    fn parse_object(&mut self) -> Result<Value, ParseError> {
        self.skip_whitespace();
        self.expect(b'{')?;
        self.enter()?;

        let mut table = Table::new().map_err(|kind| self.fail(kind))?;

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.leave();
            return Ok(Value::Object(table));
        }

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'"') => {}
                // A non-string key is a parse error, not a coercion.
                Some(_) => return Err(self.fail(ErrorKind::UnexpectedToken)),
                None => return Err(self.fail(ErrorKind::UnexpectedEndOfInput)),
            }
            let key = self.parse_string()?;

            self.skip_whitespace();
            self.expect(b':')?;

            let value = self.parse_value()?;
            // Duplicate keys: last write wins, silently.
            table.set(key, value).map_err(|kind| self.fail(kind))?;

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.peek() == Some(b'}') {
                        // Stray comma before the closing brace.
                        return Err(self.fail(ErrorKind::UnexpectedToken));
                    }
                }
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => return Err(self.fail(ErrorKind::UnexpectedToken)),
                None => return Err(self.fail(ErrorKind::UnexpectedEndOfInput)),
            }
        }

        self.leave();
        Ok(Value::Object(table))
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        self.skip_whitespace();
        self.expect(b'[')?;
        self.enter()?;

        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.leave();
            return Ok(Value::Array(items));
        }

        loop {
            let value = self.parse_value()?;
            self.try_push(&mut items, value)?;

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    if self.peek() == Some(b']') {
                        // Stray comma before the closing bracket.
                        return Err(self.fail(ErrorKind::UnexpectedToken));
                    }
                }
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => return Err(self.fail(ErrorKind::UnexpectedToken)),
                None => return Err(self.fail(ErrorKind::UnexpectedEndOfInput)),
            }
        }

        self.leave();
        Ok(Value::Array(items))
    }

    /// Parse a string literal into an owned, unescaped `String`.
    ///
    /// Verbatim spans between quote/backslash bytes are located with
    /// `memchr` and copied in bulk; escapes decode the full JSON set
    /// including `\uXXXX` with UTF-16 surrogate pairs.
    fn parse_string(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        self.expect(b'"')?;

        let mut scratch = String::new();
        loop {
            let rest = &self.bytes()[self.pos..];
            let Some(i) = memchr2(b'"', b'\\', rest) else {
                self.pos = self.src.len();
                return Err(self.fail(ErrorKind::UnexpectedEndOfInput));
            };

            self.reserve(&mut scratch, i)?;
            scratch.push_str(&self.src[self.pos..self.pos + i]);
            self.pos += i;

            if self.bytes()[self.pos] == b'"' {
                self.pos += 1;
                return Ok(scratch);
            }

            // Backslash: decode one escape.
            self.pos += 1;
            let Some(b) = self.peek() else {
                return Err(self.fail(ErrorKind::UnexpectedEndOfInput));
            };
            self.pos += 1;
            let decoded = match b {
                b'"' => '"',
                b'\\' => '\\',
                b'/' => '/',
                b'b' => '\u{8}',
                b'f' => '\u{c}',
                b'n' => '\n',
                b'r' => '\r',
                b't' => '\t',
                b'u' => self.parse_unicode_escape()?,
                _ => {
                    self.pos -= 1;
                    return Err(self.fail(ErrorKind::InvalidEscapeSequence));
                }
            };
            self.reserve(&mut scratch, decoded.len_utf8())?;
            scratch.push(decoded);
        }
    }

    /// Decode the `XXXX` of a `\uXXXX` escape, combining UTF-16 surrogate
    /// pairs into a single code point. Unpaired surrogates are invalid.
    fn parse_unicode_escape(&mut self) -> Result<char, ParseError> {
        let first = self.read_hex4()?;

        if (0xD800..=0xDBFF).contains(&first) {
            // High surrogate: a \uXXXX low surrogate must follow.
            if !self.bytes()[self.pos..].starts_with(b"\\u") {
                return Err(self.fail(ErrorKind::InvalidEscapeSequence));
            }
            self.pos += 2;
            let low = self.read_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(self.fail(ErrorKind::InvalidEscapeSequence));
            }
            let combined =
                0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
            return char::from_u32(combined)
                .ok_or_else(|| self.fail(ErrorKind::InvalidEscapeSequence));
        }
        if (0xDC00..=0xDFFF).contains(&first) {
            return Err(self.fail(ErrorKind::InvalidEscapeSequence));
        }
        char::from_u32(u32::from(first)).ok_or_else(|| self.fail(ErrorKind::InvalidEscapeSequence))
    }

    /// Read 4 hex digits.
    fn read_hex4(&mut self) -> Result<u16, ParseError> {
        let mut value: u16 = 0;
        for _ in 0..4 {
            let Some(b) = self.peek() else {
                return Err(self.fail(ErrorKind::UnexpectedEndOfInput));
            };
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                b'A'..=b'F' => b - b'A' + 10,
                _ => return Err(self.fail(ErrorKind::InvalidEscapeSequence)),
            };
            self.pos += 1;
            value = (value << 4) | u16::from(digit);
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        self.skip_whitespace();
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.pos += 1;
        }

        // Integer digits. A bare sign with nothing after it is an error.
        if self.eat_digits() == 0 {
            return Err(self.fail(ErrorKind::InvalidNumberFormat));
        }

        if self.peek() == Some(b'.') {
            self.pos += 1;
            if self.eat_digits() == 0 {
                return Err(self.fail(ErrorKind::InvalidNumberFormat));
            }
        }

        if let Some(b'e') | Some(b'E') = self.peek() {
            self.pos += 1;
            if let Some(b'+') | Some(b'-') = self.peek() {
                self.pos += 1;
            }
            if self.eat_digits() == 0 {
                return Err(self.fail(ErrorKind::InvalidNumberFormat));
            }
        }

        let text = &self.src[start..self.pos];
        let number: f64 = text
            .parse()
            .map_err(|_| ParseError::new(ErrorKind::InvalidNumberFormat, start))?;
        Ok(Value::Number(number))
    }

    fn eat_digits(&mut self) -> usize {
        let start = self.pos;
        while let Some(b'0'..=b'9') = self.peek() {
            self.pos += 1;
        }
        self.pos - start
    }

    fn parse_bool(&mut self) -> Result<Value, ParseError> {
        self.skip_whitespace();
        // Match the full literal, not a leading-character guess.
        if self.bytes()[self.pos..].starts_with(b"true") {
            self.pos += 4;
            Ok(Value::Bool(true))
        } else if self.bytes()[self.pos..].starts_with(b"false") {
            self.pos += 5;
            Ok(Value::Bool(false))
        } else {
            Err(self.fail(ErrorKind::UnexpectedToken))
        }
    }

    fn parse_null(&mut self) -> Result<Value, ParseError> {
        self.skip_whitespace();
        if self.bytes()[self.pos..].starts_with(b"null") {
            self.pos += 4;
            Ok(Value::Null)
        } else {
            Err(self.fail(ErrorKind::UnexpectedToken))
        }
    }

    // ---- cursor helpers --------------------------------------------------

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.peek() {
            self.pos += 1;
        }
    }

    /// Consume one expected byte.
    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(self.fail(ErrorKind::UnexpectedToken)),
            None => Err(self.fail(ErrorKind::UnexpectedEndOfInput)),
        }
    }

    /// Enter a bracketed construct, enforcing the depth limit.
    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(self.fail(ErrorKind::NestingTooDeep));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn fail(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.pos)
    }

    /// Reserve scratch space, surfacing allocation failure as an error
    /// instead of aborting.
    fn reserve(&self, scratch: &mut String, additional: usize) -> Result<(), ParseError> {
        scratch
            .try_reserve(additional)
            .map_err(|_| self.fail(ErrorKind::AllocationFailure))
    }

    fn try_push(&self, items: &mut Vec<Value>, value: Value) -> Result<(), ParseError> {
        if items.len() == items.capacity() {
            items
                .try_reserve(1)
                .map_err(|_| self.fail(ErrorKind::AllocationFailure))?;
        }
        items.push(value);
        Ok(())
    }
}
