//! Symbol ids and symbol metadata.
//!
//! Symbols are dense `u16` ids. Terminals, non-terminals and external tokens
//! share one id space; a handful of ids at the top of the range are reserved
//! for nodes the engine itself creates.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Dense id of a grammar symbol (terminal or non-terminal).
pub type SymbolId = u16;

/// Dense id of a parse state.
pub type StateId = u16;

/// The end-of-input terminal. Always symbol 0 in every compiled grammar.
pub const END: SymbolId = 0;

/// Nodes wrapping unexpected input.
pub const ERROR: SymbolId = u16::MAX;

/// Internal wrapper marking a zero-width missing token.
pub(crate) const MISSING: SymbolId = u16::MAX - 1;

/// Text that belongs to no token: scanner padding and unrecognized characters.
pub(crate) const PADDING: SymbolId = u16::MAX - 2;

/// Grammars must keep their symbol ids below this bound.
pub(crate) const FIRST_RESERVED: SymbolId = PADDING;

/// Which part of the grammar a symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolType {
    /// A token produced by the internal lexer.
    Terminal,
    /// A token produced by the grammar's external scanner.
    External,
    /// A grammar production.
    NonTerminal,
}

impl SymbolType {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NonTerminal)
    }
}

/// Serialized symbol table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolType,
    /// Named productions / tokens (`identifier`), as opposed to literals (`"def"`).
    pub named: bool,
    /// Hidden symbols are kept in the tree but never exposed as nodes.
    pub visible: bool,
}

/// Runtime symbol table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMetadata {
    pub name: SmolStr,
    pub kind: SymbolType,
    pub named: bool,
    pub visible: bool,
}

impl From<&SymbolInfo> for SymbolMetadata {
    fn from(info: &SymbolInfo) -> Self {
        Self {
            name: SmolStr::new(&info.name),
            kind: info.kind,
            named: info.named,
            visible: info.visible,
        }
    }
}

/// Metadata for the reserved ids, shared by all grammars.
pub(crate) fn builtin_metadata(id: SymbolId) -> Option<SymbolMetadata> {
    let (name, named, visible) = match id {
        ERROR => ("ERROR", true, true),
        MISSING => ("MISSING", true, true),
        PADDING => ("_padding", false, false),
        _ => return None,
    };
    Some(SymbolMetadata {
        name: SmolStr::new_static(name),
        kind: if id == ERROR {
            SymbolType::NonTerminal
        } else {
            SymbolType::Terminal
        },
        named,
        visible,
    })
}
