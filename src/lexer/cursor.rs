//! Cursor handed to external scanners.

use std::cell::Cell;

use crate::base::Point;

/// A cursor over the remaining input.
///
/// Characters consumed with `advance(true)` are skipped: they move the
/// token start forward and end up as padding before the token. The token
/// ends at the last `mark_end` call, or at the current position when
/// `mark_end` was never called. If the marked end lies before the token
/// start, the token collapses to zero width at the mark.
///
/// The cursor tracks row and column as it moves, one character at a time.
#[derive(Debug)]
pub struct ScanCursor<'a> {
    text: &'a str,
    position: usize,
    token_start: usize,
    token_end: Option<usize>,
    point: Point,
    examined_end: Cell<usize>,
}

impl<'a> ScanCursor<'a> {
    pub(crate) fn new(text: &'a str, position: usize, point: Point) -> Self {
        Self {
            text,
            position,
            token_start: position,
            token_end: None,
            point,
            examined_end: Cell::new(position),
        }
    }

    /// The next character, without consuming it. `None` at end of input.
    pub fn lookahead(&self) -> Option<char> {
        let next = self.text[self.position..].chars().next();
        let peeked = self.position + next.map_or(0, char::len_utf8);
        self.examined_end
            .set(self.examined_end.get().max(peeked.max(self.position + 1)));
        next
    }

    /// Consume one character. With `skip`, it becomes padding.
    pub fn advance(&mut self, skip: bool) {
        let Some(c) = self.text[self.position..].chars().next() else {
            return;
        };
        self.position += c.len_utf8();
        if c == '\n' {
            self.point.row += 1;
            self.point.column = 0;
        } else {
            self.point.column += c.len_utf8();
        }
        if skip {
            self.token_start = self.position;
        }
        self.examined_end
            .set(self.examined_end.get().max(self.position));
    }

    /// End the token at the current position.
    pub fn mark_end(&mut self) {
        self.token_end = Some(self.position);
    }

    /// Byte column of the current position.
    pub fn column(&self) -> usize {
        self.point.column
    }

    /// Current point.
    pub fn point(&self) -> Point {
        self.point
    }

    /// Byte offset of the current position.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn eof(&self) -> bool {
        self.position >= self.text.len()
    }

    /// Token byte range after scanning.
    pub(crate) fn token_range(&self) -> (usize, usize) {
        let end = self.token_end.unwrap_or(self.position);
        let start = self.token_start.min(end);
        (start, end)
    }

    /// Furthest byte the scanner looked at (exclusive).
    pub(crate) fn examined_end(&self) -> usize {
        self.examined_end.get()
    }
}
