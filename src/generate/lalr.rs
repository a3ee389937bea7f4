//! LALR(1) automaton construction and conflict resolution.
//!
//! The LR(0) collection is built first; lookaheads are then propagated to
//! a fixpoint over the kernels. Conflicts that precedence and associativity
//! do not settle stay in the table as multiple actions.

use std::collections::{BTreeMap, VecDeque};

use indexmap::{IndexMap, map::Entry};
use rustc_hash::FxHashMap;

use crate::grammar::{Action, END, LexModeTable, StateId, StateTable, SymbolId, SymbolType};

use super::error::GenerateError;
use super::expand::FlatGrammar;
use super::rules::Assoc;

/// Fixed-size set of terminal ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TermSet {
    words: Vec<u64>,
}

impl TermSet {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            words: vec![0; size.div_ceil(64)],
        }
    }

    pub(crate) fn insert(&mut self, id: SymbolId) -> bool {
        let (word, bit) = (usize::from(id) / 64, usize::from(id) % 64);
        let was_set = self.words[word] & (1 << bit) != 0;
        self.words[word] |= 1 << bit;
        !was_set
    }

    /// Add all of `other`; returns whether anything was new.
    pub(crate) fn union_with(&mut self, other: &TermSet) -> bool {
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| (index * 64 + bit) as SymbolId)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Item {
    production: usize,
    dot: usize,
}

#[derive(Debug, Clone)]
struct ClosureEntry {
    lookahead: TermSet,
    /// Precedence of the item this one was predicted from.
    inherited: Option<i32>,
}

struct LrState {
    kernel: Vec<Item>,
    transitions: BTreeMap<SymbolId, usize>,
}

pub(crate) struct TableBuilder<'a> {
    grammar: &'a FlatGrammar,
    by_lhs: Vec<Vec<usize>>,
    nullable: Vec<bool>,
    first: Vec<TermSet>,
    states: Vec<LrState>,
    lookaheads: Vec<Vec<TermSet>>,
}

impl<'a> TableBuilder<'a> {
    pub(crate) fn new(grammar: &'a FlatGrammar) -> Self {
        let count = grammar.symbols.len();
        let mut by_lhs = vec![Vec::new(); count];
        for (index, production) in grammar.productions.iter().enumerate().skip(1) {
            by_lhs[usize::from(production.lhs)].push(index);
        }
        let mut builder = Self {
            grammar,
            by_lhs,
            nullable: vec![false; count],
            first: vec![TermSet::new(grammar.terminal_count); count],
            states: Vec::new(),
            lookaheads: Vec::new(),
        };
        builder.compute_first_sets();
        builder
    }

    fn is_terminal(&self, symbol: SymbolId) -> bool {
        usize::from(symbol) < self.grammar.terminal_count
    }

    fn compute_first_sets(&mut self) {
        for terminal in 0..self.grammar.terminal_count {
            self.first[terminal].insert(terminal as SymbolId);
        }
        let mut changed = true;
        while changed {
            changed = false;
            for production in self.grammar.productions.iter().skip(1) {
                let lhs = usize::from(production.lhs);
                let mut all_nullable = true;
                for &symbol in &production.rhs {
                    let first = self.first[usize::from(symbol)].clone();
                    changed |= self.first[lhs].union_with(&first);
                    if !self.nullable[usize::from(symbol)] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !self.nullable[lhs] {
                    self.nullable[lhs] = true;
                    changed = true;
                }
            }
        }
    }

    /// FIRST of a symbol string, and whether the whole string is nullable.
    fn first_of(&self, symbols: &[SymbolId]) -> (TermSet, bool) {
        let mut set = TermSet::new(self.grammar.terminal_count);
        for &symbol in symbols {
            set.union_with(&self.first[usize::from(symbol)]);
            if !self.nullable[usize::from(symbol)] {
                return (set, false);
            }
        }
        (set, true)
    }

    fn next_symbol(&self, item: Item) -> Option<SymbolId> {
        self.grammar.productions[item.production].rhs.get(item.dot).copied()
    }

    fn closure0(&self, kernel: &[Item]) -> Vec<Item> {
        let mut items: Vec<Item> = kernel.to_vec();
        let mut predicted = vec![false; self.grammar.symbols.len()];
        let mut index = 0;
        while index < items.len() {
            let next = self.next_symbol(items[index]);
            index += 1;
            let Some(symbol) = next.filter(|&s| !self.is_terminal(s)) else {
                continue;
            };
            if !predicted[usize::from(symbol)] {
                predicted[usize::from(symbol)] = true;
                items.extend(self.by_lhs[usize::from(symbol)].iter().map(|&production| Item {
                    production,
                    dot: 0,
                }));
            }
        }
        items
    }

    fn build_lr0(&mut self) -> Result<(), GenerateError> {
        let mut index: FxHashMap<Vec<Item>, usize> = FxHashMap::default();
        let start = vec![Item {
            production: 0,
            dot: 0,
        }];
        index.insert(start.clone(), 0);
        self.states.push(LrState {
            kernel: start,
            transitions: BTreeMap::new(),
        });

        let mut current = 0;
        while current < self.states.len() {
            let mut successors: BTreeMap<SymbolId, Vec<Item>> = BTreeMap::new();
            for item in self.closure0(&self.states[current].kernel) {
                if let Some(symbol) = self.next_symbol(item) {
                    successors.entry(symbol).or_default().push(Item {
                        production: item.production,
                        dot: item.dot + 1,
                    });
                }
            }
            for (symbol, mut kernel) in successors {
                kernel.sort_unstable();
                kernel.dedup();
                let target = match index.get(&kernel) {
                    Some(&target) => target,
                    None => {
                        let target = self.states.len();
                        if target >= usize::from(StateId::MAX) {
                            return Err(GenerateError::TooLarge(format!("more than {target} states")));
                        }
                        index.insert(kernel.clone(), target);
                        self.states.push(LrState {
                            kernel,
                            transitions: BTreeMap::new(),
                        });
                        target
                    }
                };
                self.states[current].transitions.insert(symbol, target);
            }
            current += 1;
        }
        Ok(())
    }

    /// LR(1) closure of a state under the current kernel lookaheads.
    fn closure1(&self, state: usize) -> IndexMap<Item, ClosureEntry> {
        let mut entries: IndexMap<Item, ClosureEntry> = IndexMap::new();
        let mut queue: VecDeque<Item> = VecDeque::new();
        for (item, lookahead) in self.states[state].kernel.iter().zip(&self.lookaheads[state]) {
            entries.insert(*item, ClosureEntry {
                lookahead: lookahead.clone(),
                inherited: None,
            });
            queue.push_back(*item);
        }

        while let Some(item) = queue.pop_front() {
            let Some(symbol) = self.next_symbol(item) else {
                continue;
            };
            if self.is_terminal(symbol) {
                continue;
            }
            let production = &self.grammar.productions[item.production];
            let (mut lookahead, nullable) = self.first_of(&production.rhs[item.dot + 1..]);
            let parent = &entries[&item];
            if nullable {
                lookahead.union_with(&parent.lookahead);
            }
            let inherited = production.precedence.map(|(value, _)| value).or(parent.inherited);

            for &predicted in &self.by_lhs[usize::from(symbol)] {
                let child = Item {
                    production: predicted,
                    dot: 0,
                };
                match entries.entry(child) {
                    Entry::Vacant(slot) => {
                        slot.insert(ClosureEntry {
                            lookahead: lookahead.clone(),
                            inherited,
                        });
                        queue.push_back(child);
                    }
                    Entry::Occupied(mut slot) => {
                        let entry = slot.get_mut();
                        let mut changed = entry.lookahead.union_with(&lookahead);
                        if inherited > entry.inherited {
                            entry.inherited = inherited;
                            changed = true;
                        }
                        if changed {
                            queue.push_back(child);
                        }
                    }
                }
            }
        }
        entries
    }

    fn propagate_lookaheads(&mut self) {
        let size = self.grammar.terminal_count;
        self.lookaheads = self
            .states
            .iter()
            .map(|state| vec![TermSet::new(size); state.kernel.len()])
            .collect();
        self.lookaheads[0][0].insert(END);

        let mut queued = vec![false; self.states.len()];
        let mut queue = VecDeque::from([0]);
        queued[0] = true;
        while let Some(state) = queue.pop_front() {
            queued[state] = false;
            for (item, entry) in self.closure1(state) {
                let Some(symbol) = self.next_symbol(item) else {
                    continue;
                };
                let target = self.states[state].transitions[&symbol];
                let advanced = Item {
                    production: item.production,
                    dot: item.dot + 1,
                };
                let Ok(position) = self.states[target].kernel.binary_search(&advanced) else {
                    continue;
                };
                if self.lookaheads[target][position].union_with(&entry.lookahead) && !queued[target] {
                    queued[target] = true;
                    queue.push_back(target);
                }
            }
        }
    }

    /// Build the serialized parse and lex-mode tables.
    pub(crate) fn build(mut self) -> Result<(Vec<StateTable>, Vec<LexModeTable>), GenerateError> {
        self.build_lr0()?;
        self.propagate_lookaheads();

        let mut lex_modes: IndexMap<LexModeTable, u16> = IndexMap::new();
        let mut tables = Vec::with_capacity(self.states.len());
        let mut conflicts = 0usize;

        for state in 0..self.states.len() {
            let closure = self.closure1(state);

            // (target, shift precedence) per terminal, and reductions.
            let mut shifts: BTreeMap<SymbolId, (StateId, i32)> = BTreeMap::new();
            let mut reduces: BTreeMap<SymbolId, Vec<usize>> = BTreeMap::new();
            for (item, entry) in &closure {
                let production = &self.grammar.productions[item.production];
                match self.next_symbol(*item) {
                    Some(symbol) if self.is_terminal(symbol) => {
                        let target = self.states[state].transitions[&symbol] as StateId;
                        let precedence = production
                            .precedence
                            .map(|(value, _)| value)
                            .or(entry.inherited)
                            .unwrap_or(0);
                        let shift = shifts.entry(symbol).or_insert((target, precedence));
                        shift.1 = shift.1.max(precedence);
                    }
                    Some(_) => {}
                    None => {
                        for lookahead in entry.lookahead.iter() {
                            reduces.entry(lookahead).or_default().push(item.production);
                        }
                    }
                }
            }

            let mut actions: BTreeMap<SymbolId, Vec<Action>> = BTreeMap::new();
            for (&symbol, &(target, _)) in &shifts {
                actions.insert(symbol, vec![Action::Shift { state: target }]);
            }
            for (symbol, mut productions) in reduces {
                productions.sort_unstable();
                productions.dedup();
                let resolved = self.resolve(symbol, shifts.get(&symbol).map(|s| s.1), productions);
                if resolved.keep_shift && resolved.reduces.is_empty() {
                    continue;
                }
                let cell = actions.entry(symbol).or_default();
                if !resolved.keep_shift {
                    cell.clear();
                }
                for production in resolved.reduces {
                    cell.push(if production == 0 {
                        Action::Accept
                    } else {
                        Action::Reduce {
                            production: production as u16,
                        }
                    });
                }
                if cell.len() > 1 {
                    conflicts += 1;
                    tracing::debug!(state, symbol, actions = cell.len(), "keeping unresolved conflict");
                }
            }

            let mut mode = LexModeTable {
                tokens: Vec::new(),
                externals: vec![false; self.grammar.externals.len()],
            };
            for &symbol in actions.keys() {
                match self.grammar.symbols[usize::from(symbol)].kind {
                    SymbolType::Terminal if symbol != END => mode.tokens.push(symbol),
                    SymbolType::External => {
                        if let Some(index) = self.grammar.externals.iter().position(|&e| e == symbol) {
                            mode.externals[index] = true;
                        }
                    }
                    _ => {}
                }
            }
            let next_mode = lex_modes.len() as u16;
            let lex_mode = *lex_modes.entry(mode).or_insert(next_mode);

            let gotos = self.states[state]
                .transitions
                .iter()
                .filter(|(symbol, _)| !self.is_terminal(**symbol))
                .map(|(&symbol, &target)| (symbol, target as StateId))
                .collect();

            tables.push(StateTable {
                lex_mode,
                actions: actions.into_iter().collect(),
                gotos,
            });
        }

        tracing::debug!(
            states = tables.len(),
            lex_modes = lex_modes.len(),
            conflicts,
            "built parse table"
        );
        Ok((tables, lex_modes.into_keys().collect()))
    }

    /// Settle one cell. Reduce/reduce keeps the highest precedence; a
    /// shift/reduce pair is decided by precedence, then associativity, and
    /// kept as a GLR fork when neither decides.
    fn resolve(&self, symbol: SymbolId, shift: Option<i32>, reduces: Vec<usize>) -> Resolution {
        let precedence_of = |production: usize| {
            self.grammar.productions[production]
                .precedence
                .map_or(0, |(value, _)| value)
        };
        let best = reduces.iter().map(|&p| precedence_of(p)).max().unwrap_or(0);
        let reduces: Vec<usize> = reduces.into_iter().filter(|&p| precedence_of(p) == best).collect();

        let Some(shift_precedence) = shift else {
            return Resolution {
                keep_shift: false,
                reduces,
            };
        };
        if symbol == END {
            return Resolution {
                keep_shift: true,
                reduces,
            };
        }
        let assoc = |production: usize| {
            self.grammar.productions[production]
                .precedence
                .map_or(Assoc::None, |(_, assoc)| assoc)
        };
        match best.cmp(&shift_precedence) {
            std::cmp::Ordering::Greater => Resolution {
                keep_shift: false,
                reduces,
            },
            std::cmp::Ordering::Less => Resolution {
                keep_shift: true,
                reduces: Vec::new(),
            },
            std::cmp::Ordering::Equal if reduces.iter().all(|&p| assoc(p) == Assoc::Left) => Resolution {
                keep_shift: false,
                reduces,
            },
            std::cmp::Ordering::Equal if reduces.iter().all(|&p| assoc(p) == Assoc::Right) => Resolution {
                keep_shift: true,
                reduces: Vec::new(),
            },
            std::cmp::Ordering::Equal => Resolution {
                keep_shift: true,
                reduces,
            },
        }
    }
}

struct Resolution {
    keep_shift: bool,
    reduces: Vec<usize>,
}
