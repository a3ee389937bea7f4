//! Context-aware lexer.
//!
//! Lexing is driven by the parser: each parse state names a lex mode, and
//! only the tokens of that mode (plus the grammar's extras) compete at the
//! current position. Extras are collected as trivia in front of the token.

use std::sync::Arc;

use crate::base::LineIndex;
use crate::grammar::{self, Grammar, SymbolId};

use super::cursor::ScanCursor;
use super::external::{ExternalScanner, ScannerError};
use super::rules::LexMode;

/// Serialized external scanner state.
pub type ScannerState = Arc<[u8]>;

/// Lex mode id recorded on tokens that were not lexed under a state's mode.
pub(crate) const NO_LEX_MODE: u16 = u16::MAX;

/// A run of extra text in front of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia {
    pub symbol: SymbolId,
    pub start: usize,
    pub end: usize,
}

/// One lexed token together with its leading trivia.
#[derive(Debug, Clone)]
pub struct Lexeme {
    pub symbol: SymbolId,
    pub start: usize,
    pub end: usize,
    pub trivia: Vec<Trivia>,
    /// Lex mode the token was produced under.
    pub lex_mode: u16,
    pub is_external: bool,
    /// Zero-width token synthesized by error recovery.
    pub is_missing: bool,
    /// No token of the lex mode matched; the token came from the fallback.
    pub error_mode: bool,
    /// Furthest byte (exclusive) any scan looked at while producing this token.
    pub examined_end: usize,
    pub scanner_before: ScannerState,
    pub scanner_after: ScannerState,
}

impl Lexeme {
    /// A zero-width token that error recovery inserts at `position`.
    pub(crate) fn missing(symbol: SymbolId, position: usize, scanner: &ScannerState) -> Self {
        Self {
            symbol,
            start: position,
            end: position,
            trivia: Vec::new(),
            lex_mode: NO_LEX_MODE,
            is_external: false,
            is_missing: true,
            error_mode: false,
            examined_end: position,
            scanner_before: scanner.clone(),
            scanner_after: scanner.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Start of the leading trivia, i.e. where lexing began.
    pub fn full_start(&self) -> usize {
        self.trivia.first().map_or(self.start, |t| t.start)
    }
}

/// Lexer over one input text for one grammar.
pub(crate) struct Lexer<'t> {
    text: &'t str,
    grammar: &'t Grammar,
    lines: LineIndex,
    scanner: Option<&'t mut (dyn ExternalScanner + 'static)>,
    loaded_state: Option<ScannerState>,
    /// How far the last declined external scan looked.
    last_scan_end: Option<usize>,
}

impl<'t> Lexer<'t> {
    pub(crate) fn new(
        text: &'t str,
        grammar: &'t Grammar,
        scanner: Option<&'t mut (dyn ExternalScanner + 'static)>,
    ) -> Self {
        Self {
            text,
            grammar,
            lines: LineIndex::new(text),
            scanner,
            loaded_state: None,
            last_scan_end: None,
        }
    }

    pub(crate) fn text(&self) -> &'t str {
        self.text
    }

    /// Scanner state at the start of input.
    pub(crate) fn initial_scanner_state(&mut self) -> Result<ScannerState, ScannerError> {
        match self.scanner.as_deref_mut() {
            Some(scanner) => {
                scanner.deserialize(&[])?;
                let state: ScannerState = scanner.serialize().into();
                self.loaded_state = Some(state.clone());
                Ok(state)
            }
            None => Ok(Arc::from(Vec::new())),
        }
    }

    /// Lex the next token at `position` under lex mode `mode_id`.
    ///
    /// With `use_external` false the external scanner is bypassed; error
    /// recovery uses this to step past zero-width external tokens.
    pub(crate) fn lex(
        &mut self,
        position: usize,
        mode_id: u16,
        scanner_state: &ScannerState,
        use_external: bool,
    ) -> Result<Lexeme, ScannerError> {
        let grammar = self.grammar;
        let lexical = grammar.lexical();
        let mode = lexical.mode(mode_id);
        let mut pos = position;
        let mut trivia = Vec::new();
        let mut examined_end = position;

        loop {
            if let Some(mode) = mode.filter(|m| use_external && m.any_external) {
                if let Some((symbol, start, end, scanned_to, after)) =
                    self.scan_external(pos, mode, scanner_state)?
                {
                    if start > pos {
                        trivia.push(Trivia {
                            symbol: grammar::PADDING,
                            start: pos,
                            end: start,
                        });
                    }
                    return Ok(Lexeme {
                        symbol,
                        start,
                        end,
                        trivia,
                        lex_mode: mode_id,
                        is_external: true,
                        is_missing: false,
                        error_mode: false,
                        examined_end: examined_end.max(scanned_to),
                        scanner_before: scanner_state.clone(),
                        scanner_after: after,
                    });
                } else if let Some(scanned_to) = self.last_scan_end.take() {
                    examined_end = examined_end.max(scanned_to);
                }
            }

            if pos >= self.text.len() {
                return Ok(self.internal(grammar::END, pos, pos, trivia, mode_id, examined_end, scanner_state));
            }

            let valid = mode.map_or(&[][..], |m| &m.tokens[..]);
            match self.longest_match(pos, valid.iter().chain(lexical.extras())) {
                Some((symbol, len)) if lexical.is_extra(symbol) && !valid.contains(&symbol) => {
                    examined_end = examined_end.max(self.examined_bound(pos + len));
                    trivia.push(Trivia {
                        symbol,
                        start: pos,
                        end: pos + len,
                    });
                    pos += len;
                }
                Some((symbol, len)) => {
                    examined_end = examined_end.max(self.examined_bound(pos + len));
                    return Ok(self.internal(symbol, pos, pos + len, trivia, mode_id, examined_end, scanner_state));
                }
                None => {
                    // Nothing valid here: take any token, or one bad character.
                    let (symbol, end) = match self.longest_match(pos, lexical.error_tokens().iter()) {
                        Some((symbol, len)) => (symbol, pos + len),
                        None => {
                            let width = self.text[pos..].chars().next().map_or(1, char::len_utf8);
                            (grammar::ERROR, pos + width)
                        }
                    };
                    tracing::trace!(position = pos, symbol, "no valid token, lexing in error mode");
                    let mut lexeme = self.internal(symbol, pos, end, trivia, mode_id, self.text.len(), scanner_state);
                    lexeme.error_mode = true;
                    return Ok(lexeme);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn internal(
        &self,
        symbol: SymbolId,
        start: usize,
        end: usize,
        trivia: Vec<Trivia>,
        lex_mode: u16,
        examined_end: usize,
        scanner_state: &ScannerState,
    ) -> Lexeme {
        Lexeme {
            symbol,
            start,
            end,
            trivia,
            lex_mode,
            is_external: false,
            is_missing: false,
            error_mode: false,
            examined_end: examined_end.max(end),
            scanner_before: scanner_state.clone(),
            scanner_after: scanner_state.clone(),
        }
    }

    /// Longest match among `candidates` at `pos`. Ties go to literals, then
    /// to the lower symbol id.
    fn longest_match<'s>(
        &self,
        pos: usize,
        candidates: impl Iterator<Item = &'s SymbolId>,
    ) -> Option<(SymbolId, usize)> {
        let lexical = self.grammar.lexical();
        let rest = &self.text[pos..];
        let mut best: Option<(SymbolId, usize, bool)> = None;
        for &symbol in candidates {
            let Some(matcher) = lexical.matcher(symbol) else {
                continue;
            };
            let Some(len) = matcher.match_len(rest) else {
                continue;
            };
            let literal = matcher.is_literal();
            let better = match best {
                None => true,
                Some((best_symbol, best_len, best_literal)) => {
                    len > best_len
                        || (len == best_len && literal && !best_literal)
                        || (len == best_len && literal == best_literal && symbol < best_symbol)
                }
            };
            if better {
                best = Some((symbol, len, literal));
            }
        }
        best.map(|(symbol, len, _)| (symbol, len))
    }

    /// Conservative bound on how far matching a token ending at `end` may
    /// have looked: one byte past it, or to the end of its line.
    fn examined_bound(&self, end: usize) -> usize {
        let line_end = self.text[end..]
            .find('\n')
            .map_or(self.text.len(), |i| end + i + 1);
        line_end.max(end + 1).min(self.text.len() + 1)
    }

    fn scan_external(
        &mut self,
        pos: usize,
        mode: &LexMode,
        scanner_state: &ScannerState,
    ) -> Result<Option<(SymbolId, usize, usize, usize, ScannerState)>, ScannerError> {
        let Some(scanner) = self.scanner.as_deref_mut() else {
            return Ok(None);
        };
        let already_loaded = self
            .loaded_state
            .as_ref()
            .is_some_and(|loaded| loaded[..] == scanner_state[..]);
        if !already_loaded {
            scanner.deserialize(scanner_state)?;
        }

        let point = self.lines.point(self.text, pos, crate::base::ColumnEncoding::Utf8);
        let mut cursor = ScanCursor::new(self.text, pos, point);
        let result = scanner.scan(&mut cursor, &mode.externals);
        let after: ScannerState = scanner.serialize().into();
        self.loaded_state = Some(after.clone());
        let Some(index) = result? else {
            self.last_scan_end = Some(cursor.examined_end());
            return Ok(None);
        };

        let externals = self.grammar.externals();
        if !mode.externals.get(index).copied().unwrap_or(false) || index >= externals.len() {
            return Err(ScannerError::InvalidToken { index });
        }
        let (start, end) = cursor.token_range();
        Ok(Some((externals[index], start, end, cursor.examined_end(), after)))
    }
}
