//! Validated runtime grammar.

use std::fmt;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::lexer::{ExternalScanner, LexicalRules, ScannerFactory};

use super::error::GrammarError;
use super::symbol::{
    self, FIRST_RESERVED, StateId, SymbolId, SymbolMetadata, SymbolType, builtin_metadata,
};
use super::table::{Action, ParseTable};
use super::unit::LanguageTables;

/// A loaded grammar: symbol table, parse table and lexical rules.
///
/// Immutable once built. Parsers and trees hold it through `Arc<Grammar>`.
pub struct Grammar {
    name: SmolStr,
    symbols: Vec<SymbolMetadata>,
    /// Metadata of the reserved ids, indexed by `u16::MAX - id`.
    reserved: [SymbolMetadata; 3],
    names: FxHashMap<(SmolStr, bool), SymbolId>,
    table: ParseTable,
    lexical: LexicalRules,
    externals: Box<[SymbolId]>,
    scanner_name: Option<SmolStr>,
    scanner: Option<ScannerFactory>,
}

impl Grammar {
    /// Validate `tables` and build the runtime grammar.
    ///
    /// `resolve_scanner` maps the scanner name the unit declares to a
    /// factory; `None` fails the load with `UnknownScanner`.
    pub fn from_tables(
        tables: &LanguageTables,
        resolve_scanner: impl FnOnce(&str) -> Option<ScannerFactory>,
    ) -> Result<Self, GrammarError> {
        let language = tables.name.as_str();
        let malformed = |message: String| GrammarError::malformed(language, message);

        let symbol_count = tables.symbols.len();
        if symbol_count == 0 {
            return Err(malformed("empty symbol table".into()));
        }
        if symbol_count > usize::from(FIRST_RESERVED) {
            return Err(malformed(format!("{symbol_count} symbols exceed the id space")));
        }
        if tables.symbols[usize::from(symbol::END)].kind != SymbolType::Terminal {
            return Err(malformed("symbol 0 must be the end-of-input terminal".into()));
        }
        let kind_of = |id: SymbolId| tables.symbols.get(usize::from(id)).map(|s| s.kind);

        for &extra in &tables.extras {
            if kind_of(extra) != Some(SymbolType::Terminal) {
                return Err(malformed(format!("extra {extra} is not a terminal")));
            }
        }
        for &external in &tables.externals {
            if kind_of(external) != Some(SymbolType::External) {
                return Err(malformed(format!("external {external} is not an external symbol")));
            }
        }

        let state_count = tables.states.len();
        if state_count == 0 {
            return Err(malformed("parse table has no states".into()));
        }
        if state_count > usize::from(StateId::MAX) {
            return Err(malformed(format!("{state_count} states exceed the id space")));
        }
        if tables.productions.is_empty() {
            return Err(malformed("no productions".into()));
        }
        for (index, production) in tables.productions.iter().enumerate() {
            if kind_of(production.lhs) != Some(SymbolType::NonTerminal) {
                return Err(malformed(format!(
                    "production {index} has non-terminal lhs {}",
                    production.lhs
                )));
            }
        }

        for (index, state) in tables.states.iter().enumerate() {
            if usize::from(state.lex_mode) >= tables.lex_modes.len() {
                return Err(malformed(format!(
                    "state {index} uses unknown lex mode {}",
                    state.lex_mode
                )));
            }
            for (symbol, actions) in &state.actions {
                if !kind_of(*symbol).is_some_and(SymbolType::is_terminal) {
                    return Err(malformed(format!(
                        "state {index} has an action on non-terminal {symbol}"
                    )));
                }
                for action in actions {
                    let in_range = match *action {
                        Action::Shift { state } => usize::from(state) < state_count,
                        Action::Reduce { production } => {
                            usize::from(production) < tables.productions.len()
                        }
                        Action::Accept => *symbol == symbol::END,
                    };
                    if !in_range {
                        return Err(malformed(format!(
                            "state {index} has invalid action {action:?} on {symbol}"
                        )));
                    }
                }
            }
            for &(symbol, target) in &state.gotos {
                if kind_of(symbol) != Some(SymbolType::NonTerminal) || usize::from(target) >= state_count {
                    return Err(malformed(format!(
                        "state {index} has invalid goto {symbol} -> {target}"
                    )));
                }
            }
        }

        let scanner = match (&tables.external_scanner, tables.externals.is_empty()) {
            (Some(name), _) => Some(
                resolve_scanner(name).ok_or_else(|| GrammarError::UnknownScanner(name.clone()))?,
            ),
            (None, true) => None,
            (None, false) => {
                return Err(malformed("external tokens declared without a scanner".into()));
            }
        };

        let lexical = LexicalRules::new(tables)?;

        let symbols: Vec<SymbolMetadata> = tables.symbols.iter().map(SymbolMetadata::from).collect();
        let mut names = FxHashMap::default();
        for (id, meta) in symbols.iter().enumerate() {
            names
                .entry((meta.name.clone(), meta.named))
                .or_insert(id as SymbolId);
        }

        let reserved = [symbol::ERROR, symbol::MISSING, symbol::PADDING]
            .map(|id| builtin_metadata(id).unwrap_or_else(|| unreachable!("reserved id {id}")));

        Ok(Self {
            name: SmolStr::new(language),
            symbols,
            reserved,
            names,
            table: ParseTable::new(&tables.states, &tables.productions),
            lexical,
            externals: tables.externals.clone().into_boxed_slice(),
            scanner_name: tables.external_scanner.as_deref().map(SmolStr::new),
            scanner,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of grammar symbols, not counting reserved ids.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn state_count(&self) -> usize {
        self.table.state_count()
    }

    pub(crate) fn metadata(&self, id: SymbolId) -> Option<&SymbolMetadata> {
        if id >= FIRST_RESERVED {
            return self.reserved.get(usize::from(u16::MAX - id));
        }
        self.symbols.get(usize::from(id))
    }

    pub fn symbol_name(&self, id: SymbolId) -> Option<&str> {
        self.metadata(id).map(|m| m.name.as_str())
    }

    pub fn symbol_is_named(&self, id: SymbolId) -> bool {
        self.metadata(id).is_some_and(|m| m.named)
    }

    pub fn symbol_is_visible(&self, id: SymbolId) -> bool {
        self.metadata(id).is_some_and(|m| m.visible)
    }

    pub fn symbol_type(&self, id: SymbolId) -> Option<SymbolType> {
        self.metadata(id).map(|m| m.kind)
    }

    /// Id of the symbol called `name`. Named and anonymous symbols may share
    /// a name (`identifier` vs `"identifier"`), hence the flag.
    pub fn id_for_name(&self, name: &str, named: bool) -> Option<SymbolId> {
        if named && name == "ERROR" {
            return Some(symbol::ERROR);
        }
        self.names.get(&(SmolStr::new(name), named)).copied()
    }

    /// Name of the external scanner this grammar needs, if any.
    pub fn external_scanner(&self) -> Option<&str> {
        self.scanner_name.as_deref()
    }

    pub(crate) fn table(&self) -> &ParseTable {
        &self.table
    }

    pub(crate) fn lexical(&self) -> &LexicalRules {
        &self.lexical
    }

    pub(crate) fn externals(&self) -> &[SymbolId] {
        &self.externals
    }

    pub(crate) fn is_extra(&self, id: SymbolId) -> bool {
        self.lexical.is_extra(id)
    }

    /// A fresh scanner instance for one parser.
    pub(crate) fn new_scanner(&self) -> Option<Box<dyn ExternalScanner>> {
        self.scanner.as_ref().map(|factory| factory())
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("symbols", &self.symbols.len())
            .field("states", &self.table.state_count())
            .field("lex_modes", &self.lexical.mode_count())
            .field("external_scanner", &self.scanner_name)
            .finish()
    }
}
