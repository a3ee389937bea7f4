//! Subtree reuse for incremental parsing.
//!
//! When the parser sits at a token that survived the edits, subtrees of
//! the previous tree starting at the same old offset are candidates. A
//! candidate is taken when it was built error-free in the same parse state
//! with the same scanner state, and none of the text its parse depended on
//! (one byte before it through its examined end) was touched. Nodes whose
//! closing lookahead came after a recovery are never recorded, so nothing
//! reused hides an error the new text would report differently.

use std::sync::Arc;

use rowan::{GreenNode, NodeOrToken};

use super::edit::EditMap;
use super::engine::Engine;
use super::stack::StackEntry;
use crate::tree::{Tree, green_key};

/// Previous tree and the edits leading from its text to the new one.
pub(crate) struct Incremental<'a> {
    pub(crate) previous: &'a Tree,
    pub(crate) edits: EditMap,
}

impl<'a> Incremental<'a> {
    pub(crate) fn new(previous: &'a Tree, edits: EditMap) -> Self {
        Self { previous, edits }
    }

    /// Non-empty subtrees of the previous tree starting at `old_start`,
    /// outermost first. The root itself is never a candidate.
    fn candidates(&self, old_start: usize) -> Vec<GreenNode> {
        let mut found = Vec::new();
        let mut node = self.previous.green().clone();
        let mut offset = 0;
        loop {
            let mut containing = None;
            for child in node.children() {
                let len = usize::from(child.text_len());
                if offset > old_start {
                    break;
                }
                if let NodeOrToken::Node(inner) = child {
                    if offset == old_start && len > 0 {
                        found.push(inner.to_owned());
                    }
                    if old_start < offset + len {
                        containing = Some(inner.to_owned());
                        break;
                    }
                }
                offset += len;
            }
            match containing {
                Some(inner) => node = inner,
                None => return found,
            }
        }
    }
}

impl Engine<'_> {
    /// Replace the version's lookahead by a whole subtree of the previous
    /// tree, if one fits. Only done while a single version is alive.
    pub(super) fn try_reuse(&mut self, index: usize) -> bool {
        if self.versions.len() != 1 {
            return false;
        }
        let Some(incremental) = self.incremental.as_ref() else {
            return false;
        };
        let version = &self.versions[index];
        if version.queued.is_some() || version.pending_cost > 0 || version.recovered_at == Some(version.position()) {
            return false;
        }
        let Some(lookahead) = version
            .lookahead
            .as_ref()
            .filter(|l| !l.is_missing && !l.error_mode && !l.is_empty())
        else {
            return false;
        };
        let Some(old_start) = incremental.edits.to_old(lookahead.start) else {
            return false;
        };

        let state = version.stack.state;
        let table = self.grammar.table();
        let found = incremental.candidates(old_start).into_iter().find_map(|candidate| {
            let info = incremental.previous.reuse_info(&candidate)?;
            if info.state != state || info.scanner_before[..] != version.stack.scanner_after[..] {
                return None;
            }
            let from = old_start.saturating_sub(1);
            if !incremental.edits.is_preserved(from, old_start + info.lookahead_len) {
                return None;
            }
            let next = table.goto(state, candidate.kind().0)?;
            Some((candidate, info.clone(), next))
        });
        let Some((candidate, info, next)) = found else {
            return false;
        };

        let lookahead = lookahead.clone();
        let prev = self.push_trivia(version.stack.clone(), &lookahead.trivia, &lookahead.scanner_before);
        let start = lookahead.start;
        let len = usize::from(candidate.text_len());
        let entry = Arc::new(StackEntry {
            state: next,
            subtree: Some(NodeOrToken::Node(candidate.clone())),
            is_extra: false,
            end: start + len,
            error_cost: prev.error_cost,
            dynamic_precedence: prev.dynamic_precedence + info.dynamic_precedence,
            scanner_before: info.scanner_before.clone(),
            scanner_after: info.scanner_after.clone(),
            examined_end: start + info.lookahead_len,
            prev: Some(prev),
        });

        tracing::trace!(start, len, kind = candidate.kind().0, state = next, "reused subtree");
        self.pending.insert(green_key(&candidate), (candidate, info));
        self.reused += 1;

        let version = &mut self.versions[index];
        version.stack = entry;
        version.lookahead = None;
        version.reductions_without_progress = 0;
        true
    }
}

