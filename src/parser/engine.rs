//! The GLR driver.
//!
//! Parsing is a worklist of stack versions. Each step takes the active
//! version furthest behind in the input, lexes its lookahead if needed and
//! applies every action the table lists for it; the first action updates
//! the version in place and each further action runs on a clone. After a
//! step the versions are condensed: equivalent ones are merged, hopeless
//! ones dropped.
//!
//! A version with no action for its lookahead is paused. When nothing is
//! active and nothing has been accepted, the paused versions go through
//! error recovery (see `recovery.rs`).

use std::sync::Arc;

use rowan::{GreenNode, NodeOrToken};
use rustc_hash::FxHashMap;

use super::ParseOptions;
use super::error::ParseError;
use super::reuse::Incremental;
use super::stack::{self, GreenElement, StackEntry, pop_entries, same_states, split_trailing_extras};
use crate::grammar::{self, Action, Grammar, StateId};
use crate::lexer::{Lexeme, Lexer, ScannerState, Trivia};
use crate::tree::{ReuseInfo, ReuseMap, green_key};

#[derive(Debug, Clone)]
pub(super) enum Status {
    Active,
    /// No action for the lookahead; waiting for recovery.
    Paused,
    Discarded,
    Accepted(GreenNode),
}

#[derive(Debug, Clone)]
pub(super) struct Version {
    pub(super) stack: Arc<StackEntry>,
    pub(super) lookahead: Option<Lexeme>,
    /// Real lookahead to restore once an inserted missing token is shifted.
    pub(super) queued: Option<Lexeme>,
    /// Cost of a recovery not yet recorded on the stack.
    pub(super) pending_cost: u32,
    pub(super) reductions_without_progress: usize,
    /// Position of the last recovery that consumed no input.
    pub(super) recovered_at: Option<usize>,
    /// Position at which the external scanner is bypassed.
    pub(super) suppress_external_at: Option<usize>,
    pub(super) status: Status,
}

impl Version {
    fn new(stack: Arc<StackEntry>) -> Self {
        Self {
            stack,
            lookahead: None,
            queued: None,
            pending_cost: 0,
            reductions_without_progress: 0,
            recovered_at: None,
            suppress_external_at: None,
            status: Status::Active,
        }
    }

    /// Where the next lookahead starts (before its trivia).
    pub(super) fn position(&self) -> usize {
        self.stack.end
    }

    pub(super) fn cost(&self) -> u32 {
        self.stack.error_cost.saturating_add(self.pending_cost)
    }

    pub(super) fn dynamic_precedence(&self) -> i32 {
        self.stack.dynamic_precedence
    }

    pub(super) fn is_active(&self) -> bool {
        matches!(self.status, Status::Active)
    }

    pub(super) fn is_paused(&self) -> bool {
        matches!(self.status, Status::Paused)
    }

    pub(super) fn is_accepted(&self) -> bool {
        matches!(self.status, Status::Accepted(_))
    }

    fn uses_external(&self) -> bool {
        self.suppress_external_at != Some(self.position())
    }

    /// Whether `self` beats `other` in a merge.
    fn outranks(&self, other: &Version) -> bool {
        (self.cost(), -i64::from(self.dynamic_precedence())) < (other.cost(), -i64::from(other.dynamic_precedence()))
    }
}

type TokenKey = (usize, u16, ScannerState, bool);

pub(crate) struct Engine<'a> {
    pub(super) grammar: &'a Grammar,
    pub(super) lexer: Lexer<'a>,
    pub(super) options: &'a ParseOptions,
    pub(super) versions: Vec<Version>,
    tokens: FxHashMap<TokenKey, Lexeme>,
    /// Reuse records of subtrees built or reused by this parse.
    pub(super) pending: FxHashMap<usize, (GreenNode, ReuseInfo)>,
    pub(super) incremental: Option<Incremental<'a>>,
    pub(super) reused: usize,
    forks: usize,
    merges: usize,
    pub(super) recoveries: usize,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(
        grammar: &'a Grammar,
        mut lexer: Lexer<'a>,
        options: &'a ParseOptions,
        incremental: Option<Incremental<'a>>,
    ) -> Result<Self, ParseError> {
        let scanner = lexer.initial_scanner_state()?;
        let bottom = StackEntry::bottom(0, scanner);
        Ok(Self {
            grammar,
            lexer,
            options,
            versions: vec![Version::new(bottom)],
            tokens: FxHashMap::default(),
            pending: FxHashMap::default(),
            incremental,
            reused: 0,
            forks: 0,
            merges: 0,
            recoveries: 0,
        })
    }

    /// Parse to completion. Always produces a root, whatever the input.
    pub(crate) fn run(mut self) -> Result<(GreenNode, ReuseMap), ParseError> {
        let len = self.lexer.text().len();
        tracing::debug!(bytes = len, incremental = self.incremental.is_some(), "parse started");

        loop {
            if let Some(index) = self.next_active() {
                self.step(index)?;
            } else if self.versions.iter().any(Version::is_accepted) {
                break;
            } else if self.versions.iter().any(Version::is_paused) {
                self.recover()?;
            } else {
                break;
            }
            self.condense();
            self.prune_tokens();
        }

        let winner = self.versions.iter().find_map(|v| match &v.status {
            Status::Accepted(root) => Some((root.clone(), v.cost())),
            _ => None,
        });
        let (root, cost) = match winner {
            Some(found) => found,
            None => {
                tracing::warn!("no version survived, wrapping the input in an error root");
                let children = if len == 0 {
                    Vec::new()
                } else {
                    vec![stack::token(grammar::PADDING, self.lexer.text())]
                };
                (stack::node(grammar::ERROR, children), u32::MAX)
            }
        };

        let reuse = self.reuse_map(&root);
        tracing::debug!(
            bytes = len,
            cost,
            forks = self.forks,
            merges = self.merges,
            recoveries = self.recoveries,
            reused = self.reused,
            "parse finished"
        );
        Ok((root, reuse))
    }

    fn next_active(&self) -> Option<usize> {
        self.versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active())
            .min_by_key(|(index, v)| (v.position(), *index))
            .map(|(index, _)| index)
    }

    /// Lex at `position` under the lex mode of `state`, through the cache.
    pub(super) fn lex_at(
        &mut self,
        position: usize,
        state: StateId,
        scanner: &ScannerState,
        use_external: bool,
    ) -> Result<Lexeme, ParseError> {
        let mode = self.grammar.table().lex_mode(state);
        let key = (position, mode, scanner.clone(), use_external);
        if let Some(lexeme) = self.tokens.get(&key) {
            return Ok(lexeme.clone());
        }
        let lexeme = self.lexer.lex(position, mode, scanner, use_external)?;
        tracing::trace!(position, mode, symbol = lexeme.symbol, end = lexeme.end, "lexed");
        self.tokens.insert(key, lexeme.clone());
        Ok(lexeme)
    }

    fn prune_tokens(&mut self) {
        let min = self
            .versions
            .iter()
            .filter(|v| !v.is_accepted())
            .map(Version::position)
            .min();
        match min {
            Some(min) => self.tokens.retain(|key, _| key.0 >= min),
            None => self.tokens.clear(),
        }
    }

    /// Make sure the version has a lookahead lexed under its state's mode.
    fn ensure_lookahead(&mut self, index: usize) -> Result<(), ParseError> {
        let version = &self.versions[index];
        let state = version.stack.state;
        let mode = self.grammar.table().lex_mode(state);
        let stale = match &version.lookahead {
            None => true,
            Some(lexeme) => !lexeme.is_missing && lexeme.lex_mode != mode,
        };
        if stale {
            let position = version.position();
            let scanner = version.stack.scanner_after.clone();
            let use_external = version.uses_external();
            let lexeme = self.lex_at(position, state, &scanner, use_external)?;
            self.versions[index].lookahead = Some(lexeme);
        }
        Ok(())
    }

    fn step(&mut self, index: usize) -> Result<(), ParseError> {
        self.ensure_lookahead(index)?;
        if self.try_reuse(index) {
            return Ok(());
        }

        let version = &self.versions[index];
        let state = version.stack.state;
        let Some(lookahead) = version.lookahead.clone() else {
            return Ok(());
        };

        let mut actions = self.grammar.table().actions(state, lookahead.symbol).to_vec();
        if actions.is_empty() {
            if !lookahead.is_missing && self.grammar.is_extra(lookahead.symbol) {
                self.shift_extra(index, &lookahead);
            } else {
                tracing::trace!(version = index, state, symbol = lookahead.symbol, "no action, pausing");
                self.versions[index].status = Status::Paused;
            }
            return Ok(());
        }

        actions.sort_by_key(|action| match action {
            Action::Shift { .. } => 0,
            Action::Reduce { .. } => 1,
            Action::Accept => 2,
        });
        let original = (actions.len() > 1).then(|| self.versions[index].clone());

        for (n, action) in actions.into_iter().enumerate() {
            let target = match (&original, n) {
                (Some(original), 1..) => {
                    self.versions.push(original.clone());
                    self.forks += 1;
                    let target = self.versions.len() - 1;
                    tracing::trace!(from = index, to = target, ?action, "fork");
                    target
                }
                _ => index,
            };
            match action {
                Action::Shift { state } => self.shift(target, state, &lookahead),
                Action::Reduce { production } => self.reduce(target, production),
                Action::Accept => self.accept(target, &lookahead),
            }
        }
        Ok(())
    }

    fn text(&self, start: usize, end: usize) -> &'a str {
        &self.lexer.text()[start..end]
    }

    /// Push a lexeme's trivia as extras on `stack`.
    pub(super) fn push_trivia(&self, mut stack: Arc<StackEntry>, trivia: &[Trivia], scanner: &ScannerState) -> Arc<StackEntry> {
        for piece in trivia {
            stack = Arc::new(StackEntry {
                state: stack.state,
                subtree: Some(stack::token(piece.symbol, self.text(piece.start, piece.end))),
                is_extra: true,
                end: piece.end,
                error_cost: stack.error_cost,
                dynamic_precedence: stack.dynamic_precedence,
                scanner_before: scanner.clone(),
                scanner_after: scanner.clone(),
                examined_end: piece.end,
                prev: Some(stack.clone()),
            });
        }
        stack
    }

    fn shift(&mut self, index: usize, state: StateId, lexeme: &Lexeme) {
        let subtree: GreenElement = if lexeme.is_missing {
            NodeOrToken::Node(stack::node(grammar::MISSING, vec![stack::token(lexeme.symbol, "")]))
        } else {
            stack::token(lexeme.symbol, self.text(lexeme.start, lexeme.end))
        };
        let prev = self.push_trivia(self.versions[index].stack.clone(), &lexeme.trivia, &lexeme.scanner_before);

        let version = &mut self.versions[index];
        version.stack = Arc::new(StackEntry {
            state,
            subtree: Some(subtree),
            is_extra: false,
            end: lexeme.end,
            error_cost: prev.error_cost.saturating_add(version.pending_cost),
            dynamic_precedence: prev.dynamic_precedence,
            scanner_before: lexeme.scanner_before.clone(),
            scanner_after: lexeme.scanner_after.clone(),
            examined_end: lexeme.examined_end,
            prev: Some(prev),
        });
        version.pending_cost = 0;
        version.lookahead = version.queued.take();
        version.reductions_without_progress = 0;
        tracing::trace!(version = index, state, symbol = lexeme.symbol, missing = lexeme.is_missing, "shift");
    }

    /// Shift a token the lexer only produced in error mode and that is an
    /// extra of the grammar.
    fn shift_extra(&mut self, index: usize, lexeme: &Lexeme) {
        let prev = self.push_trivia(self.versions[index].stack.clone(), &lexeme.trivia, &lexeme.scanner_before);
        let version = &mut self.versions[index];
        version.stack = Arc::new(StackEntry {
            state: prev.state,
            subtree: Some(stack::token(lexeme.symbol, &self.lexer.text()[lexeme.start..lexeme.end])),
            is_extra: true,
            end: lexeme.end,
            error_cost: prev.error_cost,
            dynamic_precedence: prev.dynamic_precedence,
            scanner_before: lexeme.scanner_before.clone(),
            scanner_after: lexeme.scanner_after.clone(),
            examined_end: lexeme.examined_end,
            prev: Some(prev),
        });
        version.lookahead = None;
        version.reductions_without_progress = 0;
    }

    fn reduce(&mut self, index: usize, production: u16) {
        let table = self.grammar.table();
        let Some(production) = table.production(production).copied() else {
            self.versions[index].status = Status::Discarded;
            return;
        };

        let version = &self.versions[index];
        let (top, trailing) = split_trailing_extras(&version.stack);
        let Some((base, popped)) = pop_entries(&top, production.child_count) else {
            tracing::trace!(version = index, "stack too shallow to reduce, discarding");
            self.versions[index].status = Status::Discarded;
            return;
        };
        let Some(state) = table.goto(base.state, production.lhs) else {
            self.versions[index].status = Status::Discarded;
            return;
        };

        let children: Vec<GreenElement> = popped.iter().filter_map(|e| e.subtree.clone()).collect();
        let fully_recorded = children.iter().all(|child| match child {
            NodeOrToken::Node(node) => self.pending.contains_key(&green_key(node)),
            NodeOrToken::Token(_) => true,
        });
        let green = stack::node(production.lhs, children);

        let last = popped.last();
        let error_cost = last.map_or(base.error_cost, |e| e.error_cost);
        let dynamic_precedence =
            last.map_or(base.dynamic_precedence, |e| e.dynamic_precedence) + production.dynamic_precedence;
        let end = last.map_or(base.end, |e| e.end);
        let scanner_before = popped.first().map_or(&base.scanner_after, |e| &e.scanner_before).clone();
        let scanner_after = last.map_or(&base.scanner_after, |e| &e.scanner_after).clone();
        let examined_end = popped.iter().map(|e| e.examined_end).fold(end, usize::max);
        let start = end - usize::from(green.text_len());

        let lookahead = version.lookahead.as_ref();
        let decided_by_real_token =
            lookahead.is_some_and(|l| !l.is_missing && !l.error_mode) && version.pending_cost == 0;
        // The deciding token must directly follow the node, not a recovery.
        let next_to_recovery = version.recovered_at == Some(version.position())
            || trailing.iter().any(|extra| extra.kind() == Some(grammar::ERROR));
        if self.versions.len() == 1
            && error_cost == base.error_cost
            && fully_recorded
            && decided_by_real_token
            && !next_to_recovery
        {
            let lookahead_end = lookahead.map_or(examined_end, |l| l.examined_end.max(examined_end));
            let info = ReuseInfo {
                state: base.state,
                scanner_before: scanner_before.clone(),
                scanner_after: scanner_after.clone(),
                lookahead_len: lookahead_end - start,
                dynamic_precedence: dynamic_precedence - base.dynamic_precedence,
            };
            self.pending.insert(green_key(&green), (green.clone(), info));
        }

        let entry = Arc::new(StackEntry {
            state,
            subtree: Some(NodeOrToken::Node(green)),
            is_extra: false,
            end,
            error_cost,
            dynamic_precedence,
            scanner_before,
            scanner_after,
            examined_end,
            prev: Some(base),
        });
        let stack = trailing.iter().fold(entry, |prev, extra| extra.repush(&prev));

        let max = self.options.max_reductions_without_progress;
        let version = &mut self.versions[index];
        version.stack = stack;
        version.reductions_without_progress += 1;
        tracing::trace!(version = index, lhs = production.lhs, children = production.child_count, state, "reduce");
        if version.reductions_without_progress > max {
            tracing::trace!(version = index, "too many reductions without progress, pausing");
            version.status = Status::Paused;
        }
    }

    fn accept(&mut self, index: usize, lookahead: &Lexeme) {
        let version = &self.versions[index];
        let mut entries = Vec::new();
        let mut current = Some(&version.stack);
        while let Some(entry) = current.filter(|e| !e.is_bottom()) {
            entries.push(entry.clone());
            current = entry.prev.as_ref();
        }
        entries.reverse();

        let mut kind = grammar::ERROR;
        let mut children: Vec<GreenElement> = Vec::new();
        for entry in &entries {
            let Some(subtree) = &entry.subtree else {
                continue;
            };
            match subtree {
                NodeOrToken::Node(node) if !entry.is_extra => {
                    kind = node.kind().0;
                    children.extend(node.children().map(|child| child.to_owned()));
                }
                element => children.push(element.clone()),
            }
        }
        for piece in &lookahead.trivia {
            children.push(stack::token(piece.symbol, self.text(piece.start, piece.end)));
        }

        let root = stack::node(kind, children);
        tracing::trace!(version = index, cost = version.cost(), "accept");
        self.versions[index].status = Status::Accepted(root);
    }

    fn mergeable(&self, a: &Version, b: &Version) -> bool {
        a.is_active()
            && b.is_active()
            && a.position() == b.position()
            && a.queued.is_none()
            && b.queued.is_none()
            && a.pending_cost == 0
            && b.pending_cost == 0
            && a.suppress_external_at == b.suppress_external_at
            && a.lookahead.as_ref().map(|l| l.symbol) == b.lookahead.as_ref().map(|l| l.symbol)
            && a.stack.scanner_after[..] == b.stack.scanner_after[..]
            && same_states(&a.stack, &b.stack)
    }

    fn condense(&mut self) {
        self.versions.retain(|v| !matches!(v.status, Status::Discarded));

        let mut i = 0;
        while i < self.versions.len() {
            let mut j = i + 1;
            while j < self.versions.len() {
                if self.mergeable(&self.versions[i], &self.versions[j]) {
                    let other = self.versions.remove(j);
                    self.merges += 1;
                    tracing::trace!(kept = i, cost = self.versions[i].cost(), other_cost = other.cost(), "merge");
                    if other.outranks(&self.versions[i]) {
                        self.versions[i] = other;
                    }
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        let best_accepted = self
            .versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_accepted())
            .min_by_key(|(index, v)| (v.cost(), -i64::from(v.dynamic_precedence()), *index))
            .map(|(index, v)| (index, v.cost()));
        if let Some((winner, cost)) = best_accepted {
            let mut index = 0;
            self.versions.retain(|v| {
                let keep = match v.status {
                    Status::Accepted(_) => index == winner,
                    Status::Active => v.cost() <= cost,
                    Status::Paused | Status::Discarded => false,
                };
                index += 1;
                keep
            });
        }

        if let Some(best) = self.versions.iter().map(Version::cost).min() {
            let limit = best.saturating_add(self.options.max_cost_difference);
            self.versions.retain(|v| v.cost() <= limit);
        }

        let max = self.options.max_versions.max(1);
        if self.versions.len() > max {
            let mut order: Vec<usize> = (0..self.versions.len()).collect();
            order.sort_by_key(|&index| {
                let v = &self.versions[index];
                (!v.is_accepted(), v.cost(), -i64::from(v.dynamic_precedence()), index)
            });
            let mut keep = vec![false; self.versions.len()];
            for &index in &order[..max] {
                keep[index] = true;
            }
            let mut index = 0;
            self.versions.retain(|_| {
                let kept = keep[index];
                index += 1;
                kept
            });
        }
    }

    /// Reuse records for every recorded subtree of the finished tree.
    fn reuse_map(&self, root: &GreenNode) -> ReuseMap {
        let mut map = ReuseMap::default();
        let mut pending = vec![root.clone()];
        while let Some(node) = pending.pop() {
            let key = green_key(&node);
            let info = self.pending.get(&key).map(|(_, info)| info).or_else(|| {
                self.incremental
                    .as_ref()
                    .and_then(|incremental| incremental.previous.reuse_info(&node))
            });
            if let Some(info) = info {
                map.insert(key, info.clone());
            }
            pending.extend(node.children().filter_map(|child| child.into_node()).map(|child| child.to_owned()));
        }
        map
    }
}
