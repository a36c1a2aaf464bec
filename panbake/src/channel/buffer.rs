//! Accumulation buffer with tail-search optimization.
//!
//! Terminators are anchored to the end of the output, so only the last
//! `search_depth` bytes ever need to be searched. For long outputs (full
//! job listings, system logs) this keeps each check constant-cost.

use vte::{Parser, Perform};

use super::encoding::decode_chunk;

/// Buffer for accumulating decoded shell output.
///
/// Incoming chunks are decoded (UTF-8, Latin-1 fallback) and stripped of
/// ANSI escape sequences before they are appended.
pub struct PatternBuffer {
    /// The accumulated, cleaned output.
    buffer: String,

    /// How many bytes from the end to search for terminators.
    search_depth: usize,

    /// Escape-sequence parser; keeps state across chunk boundaries.
    parser: Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: String::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Decode `data`, strip escape sequences and append the result.
    pub fn extend(&mut self, data: &[u8]) {
        let text = decode_chunk(data);
        let mut printer = Printer {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut printer, text.as_bytes());
    }

    /// The last `search_depth` bytes of the buffer, on a char boundary.
    pub fn tail(&self) -> &str {
        let mut start = self.buffer.len().saturating_sub(self.search_depth);
        while !self.buffer.is_char_boundary(start) {
            start += 1;
        }
        &self.buffer[start..]
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> String {
        self.parser = Parser::new();
        std::mem::take(&mut self.buffer)
    }

    /// Get the buffer contents.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.parser = Parser::new();
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Keeps printable text and line structure, drops everything else.
struct Printer<'a> {
    out: &'a mut String,
}

impl Perform for Printer<'_> {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.push(byte as char);
        }
    }
}
