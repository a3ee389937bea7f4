//! Error recovery.
//!
//! Runs when every version is stuck. Each paused version proposes
//! candidates, and all of them continue as active versions; condensation
//! then keeps the cheapest. The candidates are:
//!
//! - insert a zero-width `MISSING` terminal the lookahead can follow,
//! - pop back to a state that can take the lookahead, wrapping what was
//!   popped in an `ERROR` node,
//! - skip the lookahead into an `ERROR` node.
//!
//! Skipping always consumes input, so recovery cannot loop: a version that
//! already recovered at a position without consuming anything may only
//! skip there. At the end of input with nothing else possible, the whole
//! stack becomes an `ERROR` root.

use std::sync::Arc;

use rowan::NodeOrToken;

use super::costs::{ERROR_COST_PER_MISSING_TREE, ERROR_COST_PER_RECOVERY, skipped_cost};
use super::engine::{Engine, Status, Version};
use super::error::ParseError;
use super::stack::{self, GreenElement, StackEntry, pop_entries, split_trailing_extras, state_path};
use crate::grammar::{self, Action, StateId, SymbolId, SymbolType};
use crate::lexer::Lexeme;

/// Bound on the table walk checking whether a symbol can be consumed.
const SIMULATION_BUDGET: usize = 256;

impl Engine<'_> {
    pub(super) fn recover(&mut self) -> Result<(), ParseError> {
        let (paused, rest): (Vec<Version>, Vec<Version>) =
            std::mem::take(&mut self.versions).into_iter().partition(Version::is_paused);
        self.versions = rest;

        let mut candidates = Vec::new();
        for version in &paused {
            self.recover_version(version, &mut candidates)?;
        }
        self.recoveries += 1;
        tracing::trace!(paused = paused.len(), candidates = candidates.len(), "recovered");
        self.versions.extend(candidates);
        Ok(())
    }

    fn recover_version(&mut self, version: &Version, out: &mut Vec<Version>) -> Result<(), ParseError> {
        let position = version.position();
        let Some(lookahead) = version.lookahead.clone() else {
            return Ok(());
        };

        if lookahead.is_missing {
            // The inserted token turned out useless; go back to the real one.
            let mut next = version.clone();
            next.lookahead = next.queued.take();
            next.pending_cost = 0;
            next.recovered_at = Some(position);
            next.status = Status::Active;
            out.push(next);
            return Ok(());
        }

        let mut found = false;
        if version.recovered_at != Some(position) {
            if let Some(candidate) = self.insert_missing(version, &lookahead)? {
                out.push(candidate);
                found = true;
            }
            if let Some(candidate) = self.pop_back(version, &lookahead)? {
                out.push(candidate);
                found = true;
            }
        }

        if lookahead.is_external && lookahead.is_empty() {
            if version.suppress_external_at != Some(position) {
                tracing::trace!(position, symbol = lookahead.symbol, "relexing without the external scanner");
                let mut next = version.clone();
                next.lookahead = None;
                next.suppress_external_at = Some(position);
                next.recovered_at = Some(position);
                next.status = Status::Active;
                out.push(next);
            }
            return Ok(());
        }

        if lookahead.symbol == grammar::END {
            if !found {
                out.push(self.error_root(version, &lookahead));
            }
            return Ok(());
        }

        out.push(self.skip(version, &lookahead));
        Ok(())
    }

    /// Walk the table from `path` as if `symbol` were the lookahead. Returns
    /// the state path after `symbol` is shifted (or unchanged on accept).
    fn simulate(&self, path: Vec<StateId>, symbol: SymbolId) -> Option<Vec<StateId>> {
        let table = self.grammar.table();
        let mut budget = SIMULATION_BUDGET;
        let mut work = vec![path];
        while let Some(path) = work.pop() {
            if budget == 0 {
                return None;
            }
            budget -= 1;
            let state = *path.last()?;
            for action in table.actions(state, symbol) {
                match *action {
                    Action::Shift { state } => {
                        let mut next = path.clone();
                        next.push(state);
                        return Some(next);
                    }
                    Action::Accept => return Some(path),
                    Action::Reduce { production } => {
                        let Some(production) = table.production(production) else {
                            continue;
                        };
                        if path.len() <= production.child_count {
                            continue;
                        }
                        let mut next = path[..path.len() - production.child_count].to_vec();
                        let Some(goto) = next.last().and_then(|&top| table.goto(top, production.lhs)) else {
                            continue;
                        };
                        next.push(goto);
                        work.push(next);
                    }
                }
            }
        }
        None
    }

    fn insert_missing(&mut self, version: &Version, lookahead: &Lexeme) -> Result<Option<Version>, ParseError> {
        let position = version.position();
        let grammar = self.grammar;
        let path = state_path(&version.stack);
        let scanner = version.stack.scanner_after.clone();
        let use_external = version.suppress_external_at != Some(position);

        for symbol in grammar.table().expected_terminals(version.stack.state) {
            let insertable = symbol != grammar::END
                && grammar.symbol_type(symbol) == Some(SymbolType::Terminal)
                && !grammar.is_extra(symbol);
            if !insertable {
                continue;
            }
            let Some(after) = self.simulate(path.clone(), symbol) else {
                continue;
            };
            let Some(&top) = after.last() else {
                continue;
            };
            // Only insert tokens after which the real lookahead reduces.
            let relexed = self.lex_at(position, top, &scanner, use_external)?;
            let completes = grammar
                .table()
                .actions(top, relexed.symbol)
                .iter()
                .any(|action| matches!(action, Action::Reduce { .. } | Action::Accept));
            if !completes || self.simulate(after, relexed.symbol).is_none() {
                continue;
            }

            tracing::trace!(position, symbol, before = lookahead.symbol, "inserting missing token");
            let mut next = version.clone();
            next.lookahead = Some(Lexeme::missing(symbol, position, &scanner));
            next.queued = Some(relexed);
            next.pending_cost = ERROR_COST_PER_RECOVERY + ERROR_COST_PER_MISSING_TREE;
            next.recovered_at = Some(position);
            next.reductions_without_progress = 0;
            next.status = Status::Active;
            return Ok(Some(next));
        }
        Ok(None)
    }

    fn pop_back(&mut self, version: &Version, lookahead: &Lexeme) -> Result<Option<Version>, ParseError> {
        let position = version.position();
        let scanner = version.stack.scanner_after.clone();
        let use_external = version.suppress_external_at != Some(position);
        let (top, trailing) = split_trailing_extras(&version.stack);

        let mut depth = 1;
        while let Some((base, popped)) = pop_entries(&top, depth) {
            let relexed = self.lex_at(position, base.state, &scanner, use_external)?;
            if self.simulate(state_path(&base), relexed.symbol).is_none() {
                depth += 1;
                continue;
            }
            let (Some(first), Some(last)) = (popped.first(), popped.last()) else {
                return Ok(None);
            };

            let text = &self.lexer.text()[first.start()..last.end];
            let cost = last
                .error_cost
                .saturating_add(ERROR_COST_PER_RECOVERY)
                .saturating_add(skipped_cost(depth, text));
            let children: Vec<GreenElement> = popped.iter().filter_map(|e| e.subtree.clone()).collect();
            let error = Arc::new(StackEntry {
                state: base.state,
                subtree: Some(NodeOrToken::Node(stack::node(grammar::ERROR, children))),
                is_extra: true,
                end: last.end,
                error_cost: cost,
                dynamic_precedence: base.dynamic_precedence,
                scanner_before: first.scanner_before.clone(),
                scanner_after: last.scanner_after.clone(),
                examined_end: popped.iter().map(|e| e.examined_end).fold(last.end, usize::max),
                prev: Some(base.clone()),
            });

            tracing::trace!(position, depth, state = base.state, before = lookahead.symbol, "popping back");
            let mut next = version.clone();
            next.stack = trailing.iter().fold(error, |prev, extra| extra.repush(&prev));
            next.lookahead = Some(relexed);
            next.queued = None;
            next.recovered_at = Some(position);
            next.reductions_without_progress = 0;
            next.status = Status::Active;
            return Ok(Some(next));
        }
        Ok(None)
    }

    fn skip(&self, version: &Version, lookahead: &Lexeme) -> Version {
        let text = self.lexer.text();
        let kind = if lookahead.symbol == grammar::ERROR {
            grammar::PADDING
        } else {
            lookahead.symbol
        };
        let token = stack::token(kind, &text[lookahead.start..lookahead.end]);
        let top = &version.stack;

        let open_error = match &top.subtree {
            Some(NodeOrToken::Node(node)) if top.is_extra && node.kind().0 == grammar::ERROR => Some(node),
            _ => None,
        };
        let stack = match (open_error, top.prev.as_ref()) {
            (Some(error), Some(prev)) => {
                let mut children: Vec<GreenElement> = error.children().map(|c| c.to_owned()).collect();
                for piece in &lookahead.trivia {
                    children.push(stack::token(piece.symbol, &text[piece.start..piece.end]));
                }
                children.push(token);
                let added = skipped_cost(1, &text[lookahead.full_start()..lookahead.end]);
                Arc::new(StackEntry {
                    state: top.state,
                    subtree: Some(NodeOrToken::Node(stack::node(grammar::ERROR, children))),
                    is_extra: true,
                    end: lookahead.end,
                    error_cost: top.error_cost.saturating_add(added),
                    dynamic_precedence: top.dynamic_precedence,
                    scanner_before: top.scanner_before.clone(),
                    scanner_after: lookahead.scanner_after.clone(),
                    examined_end: top.examined_end.max(lookahead.examined_end),
                    prev: Some(prev.clone()),
                })
            }
            _ => {
                let prev = self.push_trivia(top.clone(), &lookahead.trivia, &lookahead.scanner_before);
                let added = ERROR_COST_PER_RECOVERY
                    .saturating_add(skipped_cost(1, &text[lookahead.full_start()..lookahead.end]));
                Arc::new(StackEntry {
                    state: prev.state,
                    subtree: Some(NodeOrToken::Node(stack::node(grammar::ERROR, vec![token]))),
                    is_extra: true,
                    end: lookahead.end,
                    error_cost: prev.error_cost.saturating_add(added),
                    dynamic_precedence: prev.dynamic_precedence,
                    scanner_before: lookahead.scanner_before.clone(),
                    scanner_after: lookahead.scanner_after.clone(),
                    examined_end: lookahead.examined_end,
                    prev: Some(prev),
                })
            }
        };

        tracing::trace!(start = lookahead.start, end = lookahead.end, symbol = lookahead.symbol, "skipping token");
        let mut next = version.clone();
        next.stack = stack;
        next.lookahead = None;
        next.queued = None;
        next.reductions_without_progress = 0;
        next.status = Status::Active;
        next
    }

    /// Give up: everything parsed so far becomes one `ERROR` root.
    fn error_root(&self, version: &Version, lookahead: &Lexeme) -> Version {
        let text = self.lexer.text();
        let mut children = Vec::new();
        let mut trees = 0;
        let mut current = Some(&version.stack);
        while let Some(entry) = current {
            if let Some(subtree) = &entry.subtree {
                children.push(subtree.clone());
                trees += usize::from(!entry.is_extra);
            }
            current = entry.prev.as_ref();
        }
        children.reverse();
        for piece in &lookahead.trivia {
            children.push(stack::token(piece.symbol, &text[piece.start..piece.end]));
        }

        tracing::trace!(trees, "wrapping the input in an error root");
        let mut next = version.clone();
        next.pending_cost = ERROR_COST_PER_RECOVERY.saturating_add(skipped_cost(trees.max(1), text));
        next.status = Status::Accepted(stack::node(grammar::ERROR, children));
        next
    }
}
