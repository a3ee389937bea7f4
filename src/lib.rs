//! # arbor
//!
//! Grammar-driven GLR parsing engine producing lossless concrete syntax trees.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! parser    → GLR engine, error recovery, incremental reuse
//!   ↓
//! tree      → Tree / Node views over rowan green nodes, s-expressions
//!   ↓
//! lexer     → Context-aware lexing, external scanners
//!   ↓
//! grammar   → Compiled units, symbol tables, parse tables, registry
//!   ↓
//! base      → Primitives (Point, LineIndex, ColumnEncoding)
//! ```
//!
//! `generate` sits beside the stack: it builds compiled units from rule
//! combinators and is only needed to produce grammars, never to parse.
//!
//! ```ignore
//! let grammar = arbor::load("build/languages.json", "python")?;
//! let mut parser = arbor::Parser::new();
//! parser.set_language(&grammar);
//! let tree = parser.parse("def foo():\n  bar()")?;
//! assert_eq!(tree.root_node().kind(), "module");
//! ```

// ============================================================================
// MODULES (dependency order: base → grammar → lexer → tree → parser)
// ============================================================================

/// Foundation types: Point, LineIndex, ColumnEncoding
pub mod base;

/// Compiled grammars: symbol table, parse table, registry
pub mod grammar;

/// Context-aware lexer and external scanner hooks
pub mod lexer;

/// Immutable trees and node views
pub mod tree;

/// GLR parser engine
pub mod parser;

/// Parse-table generator for compiled units
pub mod generate;

// Re-export commonly needed items
pub use base::{ColumnEncoding, LineIndex, Point};
pub use grammar::{CompiledUnit, Grammar, GrammarError, Registry, SymbolId, load};
pub use lexer::{ExternalScanner, IndentScanner, ScanCursor, ScannerError};
pub use parser::{InputEdit, ParseError, ParseOptions, Parser, parse_batch};
pub use tree::{Node, Tree};

/// Re-export rowan types for convenience
pub use rowan::{GreenNode, TextRange, TextSize};
