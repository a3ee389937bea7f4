//! Persistent parse stacks.
//!
//! A stack is a linked list of `Arc` entries, top first. Forking a version
//! clones the top pointer; versions that share a prefix share its entries.

use std::sync::Arc;

use rowan::{GreenNode, GreenToken, NodeOrToken, SyntaxKind};

use crate::grammar::{StateId, SymbolId};
use crate::lexer::ScannerState;

pub(crate) type GreenElement = NodeOrToken<GreenNode, GreenToken>;

pub(crate) fn element_kind(element: &GreenElement) -> SymbolId {
    match element {
        NodeOrToken::Node(node) => node.kind().0,
        NodeOrToken::Token(token) => token.kind().0,
    }
}

pub(crate) fn element_len(element: &GreenElement) -> usize {
    match element {
        NodeOrToken::Node(node) => usize::from(node.text_len()),
        NodeOrToken::Token(token) => usize::from(token.text_len()),
    }
}

pub(crate) fn token(kind: SymbolId, text: &str) -> GreenElement {
    NodeOrToken::Token(GreenToken::new(SyntaxKind(kind), text))
}

pub(crate) fn node(kind: SymbolId, children: Vec<GreenElement>) -> GreenNode {
    GreenNode::new(SyntaxKind(kind), children)
}

#[derive(Debug)]
pub(crate) struct StackEntry {
    pub state: StateId,
    /// `None` only for the bottom entry.
    pub subtree: Option<GreenElement>,
    pub is_extra: bool,
    /// Byte offset where this entry's text ends.
    pub end: usize,
    /// Total error cost of the stack up to and including this entry.
    pub error_cost: u32,
    /// Total dynamic precedence of the stack up to and including this entry.
    pub dynamic_precedence: i32,
    pub scanner_before: ScannerState,
    pub scanner_after: ScannerState,
    /// Furthest byte lexing looked at while producing this entry.
    pub examined_end: usize,
    pub prev: Option<Arc<StackEntry>>,
}

impl StackEntry {
    pub(crate) fn bottom(state: StateId, scanner: ScannerState) -> Arc<Self> {
        Arc::new(Self {
            state,
            subtree: None,
            is_extra: false,
            end: 0,
            error_cost: 0,
            dynamic_precedence: 0,
            scanner_before: scanner.clone(),
            scanner_after: scanner,
            examined_end: 0,
            prev: None,
        })
    }

    pub(crate) fn is_bottom(&self) -> bool {
        self.prev.is_none()
    }

    /// Error cost contributed by this entry alone.
    pub(crate) fn own_cost(&self) -> u32 {
        self.error_cost - self.prev.as_ref().map_or(0, |p| p.error_cost)
    }

    /// Byte offset where this entry's text starts.
    pub(crate) fn start(&self) -> usize {
        self.end - self.subtree.as_ref().map_or(0, element_len)
    }

    pub(crate) fn kind(&self) -> Option<SymbolId> {
        self.subtree.as_ref().map(element_kind)
    }

    /// Copy this entry on top of `prev`, carrying its own cost along.
    pub(crate) fn repush(&self, prev: &Arc<StackEntry>) -> Arc<StackEntry> {
        Arc::new(StackEntry {
            state: prev.state,
            subtree: self.subtree.clone(),
            is_extra: self.is_extra,
            end: self.end,
            error_cost: prev.error_cost + self.own_cost(),
            dynamic_precedence: prev.dynamic_precedence,
            scanner_before: self.scanner_before.clone(),
            scanner_after: self.scanner_after.clone(),
            examined_end: self.examined_end,
            prev: Some(prev.clone()),
        })
    }
}

/// Peel extras off the top of `stack`. Returns the first non-extra entry
/// and the peeled extras in source order.
pub(crate) fn split_trailing_extras(stack: &Arc<StackEntry>) -> (Arc<StackEntry>, Vec<Arc<StackEntry>>) {
    let mut trailing = Vec::new();
    let mut top = stack.clone();
    while top.is_extra {
        let Some(prev) = top.prev.clone() else {
            break;
        };
        trailing.push(top);
        top = prev;
    }
    trailing.reverse();
    (top, trailing)
}

/// Pop `count` non-extra entries (with the extras between them) off `top`,
/// which must not be an extra. Returns the base and the popped entries in
/// source order, or `None` if the stack is too shallow.
pub(crate) fn pop_entries(top: &Arc<StackEntry>, count: usize) -> Option<(Arc<StackEntry>, Vec<Arc<StackEntry>>)> {
    let mut popped = Vec::new();
    let mut current = top.clone();
    let mut remaining = count;
    while remaining > 0 {
        if current.is_bottom() {
            return None;
        }
        if !current.is_extra {
            remaining -= 1;
        }
        let prev = current.prev.clone()?;
        popped.push(current);
        current = prev;
    }
    popped.reverse();
    Some((current, popped))
}

/// Whether two stacks go through the same sequence of states.
pub(crate) fn same_states(a: &Arc<StackEntry>, b: &Arc<StackEntry>) -> bool {
    let mut a = Some(a);
    let mut b = Some(b);
    loop {
        match (a, b) {
            (None, None) => return true,
            (Some(x), Some(y)) => {
                if Arc::ptr_eq(x, y) {
                    return true;
                }
                if x.state != y.state || x.is_extra != y.is_extra {
                    return false;
                }
                a = x.prev.as_ref();
                b = y.prev.as_ref();
            }
            _ => return false,
        }
    }
}

/// States of the non-extra entries, bottom first.
pub(crate) fn state_path(stack: &Arc<StackEntry>) -> Vec<StateId> {
    let mut states = Vec::new();
    let mut current = Some(stack);
    while let Some(entry) = current {
        if !entry.is_extra {
            states.push(entry.state);
        }
        current = entry.prev.as_ref();
    }
    states.reverse();
    states
}
