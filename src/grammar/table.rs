//! LR parse tables.
//!
//! The serialized form (`StateTable`, `ProductionInfo`, `LexModeTable`) is
//! what compiled units carry. `ParseTable` is the validated runtime form with
//! hashed lookups.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::symbol::{StateId, SymbolId};

/// A parse action for a (state, lookahead) pair.
///
/// A cell holding more than one action is an unresolved conflict; the
/// engine explores each action on its own stack version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Shift { state: StateId },
    Reduce { production: u16 },
    Accept,
}

/// Serialized production: only what the engine needs to reduce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionInfo {
    pub lhs: SymbolId,
    pub child_count: u16,
    #[serde(default)]
    pub dynamic_precedence: i32,
}

/// Serialized state: action row, goto row and lex mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTable {
    pub lex_mode: u16,
    pub actions: Vec<(SymbolId, Vec<Action>)>,
    pub gotos: Vec<(SymbolId, StateId)>,
}

/// Serialized lex mode: internal tokens valid in a state, and a validity
/// flag for each external token (indexed like the grammar's externals).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LexModeTable {
    pub tokens: Vec<SymbolId>,
    pub externals: Vec<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Production {
    pub lhs: SymbolId,
    pub child_count: usize,
    pub dynamic_precedence: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct ParseState {
    actions: FxHashMap<SymbolId, Box<[Action]>>,
    gotos: FxHashMap<SymbolId, StateId>,
    lex_mode: u16,
}

/// Runtime parse table.
#[derive(Debug, Clone)]
pub struct ParseTable {
    states: Vec<ParseState>,
    productions: Vec<Production>,
}

impl ParseTable {
    /// Build the runtime table. Range checks happen in `Grammar::from_tables`.
    pub(crate) fn new(states: &[StateTable], productions: &[ProductionInfo]) -> Self {
        let states = states
            .iter()
            .map(|state| ParseState {
                actions: state
                    .actions
                    .iter()
                    .map(|(symbol, actions)| (*symbol, actions.clone().into_boxed_slice()))
                    .collect(),
                gotos: state.gotos.iter().copied().collect(),
                lex_mode: state.lex_mode,
            })
            .collect();
        let productions = productions
            .iter()
            .map(|p| Production {
                lhs: p.lhs,
                child_count: usize::from(p.child_count),
                dynamic_precedence: p.dynamic_precedence,
            })
            .collect();
        Self {
            states,
            productions,
        }
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Actions for `symbol` in `state`; empty when the symbol is unexpected.
    pub fn actions(&self, state: StateId, symbol: SymbolId) -> &[Action] {
        self.states
            .get(usize::from(state))
            .and_then(|s| s.actions.get(&symbol))
            .map_or(&[], |actions| actions)
    }

    pub fn goto(&self, state: StateId, symbol: SymbolId) -> Option<StateId> {
        self.states
            .get(usize::from(state))
            .and_then(|s| s.gotos.get(&symbol).copied())
    }

    pub fn lex_mode(&self, state: StateId) -> u16 {
        self.states
            .get(usize::from(state))
            .map_or(0, |s| s.lex_mode)
    }

    pub fn production(&self, index: u16) -> Option<&Production> {
        self.productions.get(usize::from(index))
    }

    /// Terminals with at least one action in `state`, in ascending id order.
    pub fn expected_terminals(&self, state: StateId) -> Vec<SymbolId> {
        let mut symbols: Vec<SymbolId> = self
            .states
            .get(usize::from(state))
            .map(|s| s.actions.keys().copied().collect())
            .unwrap_or_default();
        symbols.sort_unstable();
        symbols
    }
}
