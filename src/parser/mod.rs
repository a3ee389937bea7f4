//! GLR parser.
//!
//! ```text
//! text ─► Lexer (lex modes, external scanner) ─► Engine (GLR versions)
//!                                                   │  shift / reduce / fork / merge
//!                                                   │  error recovery
//!                                                   │  reuse of previous subtrees
//!                                                   ▼
//!                                        GreenNode + reuse records ─► Tree
//! ```
//!
//! A [`Parser`] holds one grammar and its external scanner instance. Every
//! `parse` call is independent; `parse_with` additionally takes the
//! previous tree and the edits made since, and splices in every subtree of
//! the previous tree that the edits could not have affected. The result is
//! always the same tree a fresh parse would produce.

mod batch;
mod costs;
mod edit;
mod engine;
mod error;
mod recovery;
mod reuse;
mod stack;

use std::sync::Arc;

use crate::base::ColumnEncoding;
use crate::grammar::Grammar;
use crate::lexer::{ExternalScanner, Lexer};
use crate::tree::Tree;

pub use batch::parse_batch;
pub use edit::{InputEdit, InvalidEdit};
pub use error::ParseError;

use edit::EditMap;
use engine::Engine;
use reuse::Incremental;

/// Tuning knobs of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// How columns of reported points are counted.
    pub column_encoding: ColumnEncoding,
    /// Maximum number of stack versions kept alive at once.
    pub max_versions: usize,
    /// Versions whose error cost exceeds the best one's by more than this
    /// are dropped.
    pub max_cost_difference: u32,
    /// Consecutive reductions a version may perform without consuming
    /// input before it is treated as stuck.
    pub max_reductions_without_progress: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            column_encoding: ColumnEncoding::Utf8,
            max_versions: 6,
            max_cost_difference: 1600,
            max_reductions_without_progress: 10_000,
        }
    }
}

impl ParseOptions {
    pub fn with_column_encoding(mut self, encoding: ColumnEncoding) -> Self {
        self.column_encoding = encoding;
        self
    }

    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions;
        self
    }

    pub fn with_max_cost_difference(mut self, max_cost_difference: u32) -> Self {
        self.max_cost_difference = max_cost_difference;
        self
    }

    pub fn with_max_reductions_without_progress(mut self, max: usize) -> Self {
        self.max_reductions_without_progress = max;
        self
    }
}

/// Parses text with one grammar at a time.
///
/// `Parser` is `Send`; parsing needs `&mut self` because the external
/// scanner instance is mutated while lexing.
#[derive(Default)]
pub struct Parser {
    grammar: Option<Arc<Grammar>>,
    scanner: Option<Box<dyn ExternalScanner>>,
    options: ParseOptions,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Switch to `grammar`, replacing the previous grammar and scanner.
    pub fn set_language(&mut self, grammar: &Arc<Grammar>) {
        self.scanner = grammar.new_scanner();
        self.grammar = Some(grammar.clone());
    }

    pub fn language(&self) -> Option<&Arc<Grammar>> {
        self.grammar.as_ref()
    }

    /// Parse `text` from scratch.
    pub fn parse(&mut self, text: &str) -> Result<Tree, ParseError> {
        self.run(text, None)
    }

    /// Parse `text`, reusing what `previous` has in common with it.
    ///
    /// `edits` turn `previous.text()` into `text`, in order. They are
    /// validated before anything else happens. `previous` is not modified
    /// and may seed any number of further parses.
    pub fn parse_with(&mut self, text: &str, previous: &Tree, edits: &[InputEdit]) -> Result<Tree, ParseError> {
        let grammar = self.grammar.as_ref().ok_or(ParseError::NoLanguage)?;
        if !Arc::ptr_eq(grammar, previous.language()) {
            return Err(ParseError::LanguageMismatch {
                previous: previous.language().name().into(),
                current: grammar.name().into(),
            });
        }
        let edits = EditMap::new(previous.text().len(), text.len(), edits)?;
        self.run(text, Some(Incremental::new(previous, edits)))
    }

    fn run(&mut self, text: &str, incremental: Option<Incremental<'_>>) -> Result<Tree, ParseError> {
        let grammar = self.grammar.clone().ok_or(ParseError::NoLanguage)?;
        if u32::try_from(text.len()).is_err() {
            return Err(ParseError::InputTooLarge(text.len()));
        }

        let lexer = Lexer::new(text, &grammar, self.scanner.as_deref_mut());
        let (green, reuse) = Engine::new(&grammar, lexer, &self.options, incremental)?.run()?;
        Ok(Tree::new(
            green,
            Arc::from(text),
            grammar.clone(),
            self.options.column_encoding,
            reuse,
        ))
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.grammar.as_ref().map(|g| g.name()))
            .field("scanner", &self.scanner.is_some())
            .field("options", &self.options)
            .finish()
    }
}
