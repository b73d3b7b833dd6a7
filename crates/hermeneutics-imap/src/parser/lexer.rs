//! Byte cursor over one complete response.
//!
//! The input holds the response lines, each ending in CRLF, with the bytes
//! of every `{n}` literal following the line that announced it.

use crate::error::{Error, Result};

/// Cursor state.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// The next byte, if any.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Returns true at a line break or the end of input.
    #[must_use]
    pub fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(b'\r' | b'\n'))
    }

    /// Steps over one byte.
    pub fn advance(&mut self) {
        self.pos = (self.pos + 1).min(self.input.len());
    }

    /// Consumes `byte` or fails.
    pub fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", char::from(byte))))
        }
    }

    /// Consumes CRLF or a bare LF.
    pub fn expect_line_end(&mut self) -> Result<()> {
        if self.peek() == Some(b'\r') {
            self.pos += 1;
        }
        self.expect(b'\n')
    }

    /// Skips spaces and tabs.
    pub fn skip_spaces(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// Consumes bytes up to a space or the end of the line.
    pub fn word(&mut self) -> &'a [u8] {
        let start = self.pos;
        while !self.at_line_end() && self.peek() != Some(b' ') {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// The word ahead, without consuming it.
    #[must_use]
    pub fn peek_word(&self) -> &'a [u8] {
        let rest = &self.input[self.pos..];
        let end = rest
            .iter()
            .position(|b| matches!(b, b' ' | b'\r' | b'\n'))
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// Consumes the rest of the line, without its line break.
    pub fn rest_of_line(&mut self) -> &'a [u8] {
        let start = self.pos;
        while !self.at_line_end() {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Consumes `n` raw bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error(format!("literal of {n} bytes is truncated")))?;
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Consumes an atom: everything up to a space, a closing parenthesis or
    /// an unmatched `]`. Bracketed sections such as `BODY[HEADER (DATE)]`
    /// belong to the atom, spaces included.
    pub fn atom(&mut self) -> &'a [u8] {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(b) = self.peek() {
            match b {
                b'\r' | b'\n' => break,
                b' ' | b')' if depth == 0 => break,
                b']' if depth == 0 => break,
                b'[' => depth += 1,
                b']' => depth -= 1,
                _ => {}
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// A parse error at the current position.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.pos, message)
    }
}
