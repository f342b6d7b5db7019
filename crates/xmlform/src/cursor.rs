//! Byte cursor for markup scanning

use crate::error::Pos;

/// Cursor over byte input with line/column tracking
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Current byte without consuming
    pub fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Byte `ahead` positions past the current one
    pub fn peek(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos.saturating_add(ahead)).copied()
    }

    pub fn starts_with(&self, pattern: &[u8]) -> bool {
        self.remaining().starts_with(pattern)
    }

    pub fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else if b & 0xC0 != 0x80 {
                // continuation bytes of a multi-byte char share its column
                self.col += 1;
            }
        }
    }

    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Consume `pattern` if the input continues with it
    pub fn eat(&mut self, pattern: &[u8]) -> bool {
        if self.starts_with(pattern) {
            self.advance_by(pattern.len());
            true
        } else {
            false
        }
    }

    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.current() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advance until `pattern` has been consumed; false when input ran out first
    pub fn skip_past(&mut self, pattern: &[u8]) -> bool {
        while !self.is_eof() {
            if self.eat(pattern) {
                return true;
            }
            self.advance();
        }
        false
    }

    pub const fn position(&self) -> Pos {
        Pos::new(self.pos, self.line, self.col)
    }

    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.input.get(self.pos..).unwrap_or_default()
    }

    /// Current byte offset
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes between `start` and the current offset
    pub fn slice_from(&self, start: usize) -> &'a [u8] {
        self.input.get(start..self.pos).unwrap_or_default()
    }
}
