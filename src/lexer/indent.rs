//! Offside-rule scanner.
//!
//! Produces the three external tokens indentation-sensitive grammars need,
//! in this order in the grammar's externals list:
//!
//! | index | token   | emitted when                                        |
//! |-------|---------|-----------------------------------------------------|
//! | 0     | newline | a line ends (or input ends) and a statement may end |
//! | 1     | indent  | the next line is indented deeper than the block     |
//! | 2     | dedent  | the next line is indented shallower, or input ends  |
//!
//! All three are zero-width and sit right after the previous token; the
//! line break and indentation themselves are left for the internal lexer
//! to consume as whitespace.

use super::cursor::ScanCursor;
use super::external::{ExternalScanner, ScannerError};

const NEWLINE: usize = 0;
const INDENT: usize = 1;
const DEDENT: usize = 2;

const TAB_WIDTH: u16 = 8;

/// Indentation stack scanner. The base level 0 is implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndentScanner {
    indents: Vec<u16>,
}

impl IndentScanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> u16 {
        self.indents.last().copied().unwrap_or(0)
    }

    /// Nesting depth of open indented blocks.
    pub fn depth(&self) -> usize {
        self.indents.len()
    }
}

impl ExternalScanner for IndentScanner {
    fn scan(
        &mut self,
        cursor: &mut ScanCursor<'_>,
        valid: &[bool],
    ) -> Result<Option<usize>, ScannerError> {
        let is_valid = |index: usize| valid.get(index).copied().unwrap_or(false);

        cursor.mark_end();

        let mut found_line_end = false;
        let mut indent: u16 = 0;
        loop {
            match cursor.lookahead() {
                Some('\n') => {
                    found_line_end = true;
                    indent = 0;
                    cursor.advance(true);
                }
                Some(' ') => {
                    indent = indent.saturating_add(1);
                    cursor.advance(true);
                }
                Some('\t') => {
                    indent = indent.saturating_add(TAB_WIDTH);
                    cursor.advance(true);
                }
                Some('\r') | Some('\x0c') => {
                    indent = 0;
                    cursor.advance(true);
                }
                None => {
                    found_line_end = true;
                    break;
                }
                Some(_) => break,
            }
        }

        if !found_line_end {
            return Ok(None);
        }

        let at_eof = cursor.eof();
        // Comment-only lines do not open or close blocks.
        let at_comment = cursor.lookahead() == Some('#');

        if !at_eof && !at_comment && is_valid(INDENT) && indent > self.current() {
            self.indents.push(indent);
            return Ok(Some(INDENT));
        }

        let dedenting = if at_eof {
            !self.indents.is_empty()
        } else {
            !at_comment && indent < self.current()
        };
        if dedenting && is_valid(DEDENT) {
            self.indents.pop();
            return Ok(Some(DEDENT));
        }

        if is_valid(NEWLINE) {
            return Ok(Some(NEWLINE));
        }

        Ok(None)
    }

    fn serialize(&self) -> Vec<u8> {
        self.indents.iter().flat_map(|level| level.to_le_bytes()).collect()
    }

    fn deserialize(&mut self, state: &[u8]) -> Result<(), ScannerError> {
        if state.len() % 2 != 0 {
            return Err(ScannerError::CorruptState(format!(
                "indent state has odd length {}",
                state.len()
            )));
        }
        self.indents = state
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(())
    }
}
