//! Compiled grammars.
//!
//! A grammar arrives as a [`CompiledUnit`] (versioned JSON tables), is
//! validated into a [`Grammar`], and is shared through the [`Registry`]
//! cache as `Arc<Grammar>`.

mod error;
mod language;
mod registry;
mod symbol;
mod table;
mod unit;

pub use error::GrammarError;
pub use language::Grammar;
pub use registry::{Registry, UnitSource, load};
pub use symbol::{END, ERROR, StateId, SymbolId, SymbolInfo, SymbolMetadata, SymbolType};
pub use table::{Action, LexModeTable, ParseTable, Production, ProductionInfo, StateTable};
pub use unit::{ABI_VERSION, CompiledUnit, LanguageTables, TokenPattern, TokenRule};

pub(crate) use symbol::{FIRST_RESERVED, MISSING, PADDING};
