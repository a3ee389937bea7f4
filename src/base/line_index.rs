//! Byte offset to [`Point`] conversion.
//!
//! The index stores the byte offset of every line start. It can be built in
//! one pass over a finished text, or grown incrementally while a lexer
//! advances (`push_newline`), so position bookkeeping never rescans input.

use super::{ColumnEncoding, Point};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offset of the first byte of each line. Always starts with 0.
    line_starts: Vec<usize>,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self {
            line_starts: vec![0],
        }
    }
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut index = Self::default();
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                index.push_newline(offset);
            }
        }
        index
    }

    /// Record a `\n` at `offset`. Offsets must be pushed in increasing order.
    pub fn push_newline(&mut self, offset: usize) {
        debug_assert!(self.line_starts.last().is_none_or(|&last| last <= offset));
        self.line_starts.push(offset + 1);
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where `row` starts, if the row exists.
    pub fn line_start(&self, row: usize) -> Option<usize> {
        self.line_starts.get(row).copied()
    }

    /// Convert a byte offset into a point.
    ///
    /// `text` must be the text the index was built for; it is only read
    /// for UTF-16 column counting.
    pub fn point(&self, text: &str, offset: usize, encoding: ColumnEncoding) -> Point {
        let offset = offset.min(text.len());
        let row = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = self.line_starts[row];
        let column = match encoding {
            ColumnEncoding::Utf8 => offset - line_start,
            ColumnEncoding::Utf16 => text
                .get(line_start..offset)
                .map_or(offset - line_start, |prefix| encoding.width(prefix)),
        };
        Point::new(row, column)
    }
}
