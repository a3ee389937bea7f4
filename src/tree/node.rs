//! Positioned node views.
//!
//! A [`Node`] pairs the owning tree with a `RawNode`: one green element at
//! an absolute offset, a weak link to its parent view and a lazily filled
//! cache of child views. Hidden green nodes never get a view; their
//! children are spliced into the nearest visible ancestor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use rowan::{GreenNode, GreenNodeData, GreenToken, GreenTokenData, NodeOrToken, TextRange, TextSize};

use crate::base::Point;
use crate::grammar::{self, SymbolId};

use super::{TreeData, green_key};

type GreenElement = NodeOrToken<GreenNode, GreenToken>;

pub(crate) struct RawNode {
    green: GreenElement,
    /// Absolute offset of the green element.
    offset: usize,
    start: usize,
    end: usize,
    parent: Weak<RawNode>,
    /// Position in the parent's child views.
    index: usize,
    children: OnceCell<Arc<[Node]>>,
}

/// A node of a [`Tree`](super::Tree).
///
/// Nodes are cheap handles. Asking for the same node twice (through
/// `children`, `parent` or the siblings) yields handles to the same view,
/// and `children()` returns the same `Arc` every time.
#[derive(Clone)]
pub struct Node {
    tree: Arc<TreeData>,
    raw: Arc<RawNode>,
}

fn raw_kind(green: &GreenElement) -> SymbolId {
    match green {
        NodeOrToken::Node(node) => node.kind().0,
        NodeOrToken::Token(token) => token.kind().0,
    }
}

fn is_visible(tree: &TreeData, kind: SymbolId) -> bool {
    matches!(kind, grammar::ERROR | grammar::MISSING) || tree.grammar.symbol_is_visible(kind)
}

/// Start of the first token that is part of the tree's structure, skipping
/// hidden trivia and the end-of-input token.
fn first_structural_start(tree: &TreeData, green: &GreenNodeData, mut offset: usize) -> Option<usize> {
    for child in green.children() {
        match child {
            NodeOrToken::Node(node) => {
                if node.kind().0 == grammar::MISSING {
                    return Some(offset);
                }
                if let Some(start) = first_structural_start(tree, node, offset) {
                    return Some(start);
                }
                offset += usize::from(node.text_len());
            }
            NodeOrToken::Token(token) => {
                let kind = token.kind().0;
                let trivia = kind == grammar::END
                    || kind == grammar::PADDING
                    || (tree.grammar.is_extra(kind) && !tree.grammar.symbol_is_visible(kind));
                if !trivia {
                    return Some(offset);
                }
                offset += usize::from(token.text_len());
            }
        }
    }
    None
}

fn collect_visible(
    tree: &TreeData,
    green: &GreenNodeData,
    mut offset: usize,
    parent: &Weak<RawNode>,
    out: &mut Vec<Arc<RawNode>>,
) {
    for child in green.children() {
        let (element, len, inner) = match child {
            NodeOrToken::Node(node) => (
                NodeOrToken::Node(node.to_owned()),
                usize::from(node.text_len()),
                Some(node),
            ),
            NodeOrToken::Token(token) => (
                NodeOrToken::Token(token.to_owned()),
                usize::from(token.text_len()),
                None,
            ),
        };
        let kind = raw_kind(&element);
        if is_visible(tree, kind) {
            out.push(Arc::new(RawNode {
                green: element,
                offset,
                start: offset,
                end: offset + len,
                parent: parent.clone(),
                index: out.len(),
                children: OnceCell::new(),
            }));
        } else if let Some(node) = inner {
            collect_visible(tree, node, offset, parent, out);
        }
        offset += len;
    }
}

fn green_has_error(green: &GreenNodeData) -> bool {
    green.children().any(|child| match child {
        NodeOrToken::Node(node) => {
            matches!(node.kind().0, grammar::ERROR | grammar::MISSING) || green_has_error(node)
        }
        NodeOrToken::Token(token) => token.kind().0 == grammar::ERROR,
    })
}

impl Node {
    pub(crate) fn root(tree: &Arc<TreeData>) -> Self {
        let len = tree.text.len();
        let start = first_structural_start(tree, &tree.green, 0).unwrap_or(len);
        Self {
            tree: tree.clone(),
            raw: Arc::new(RawNode {
                green: NodeOrToken::Node(tree.green.clone()),
                offset: 0,
                start,
                end: len,
                parent: Weak::new(),
                index: 0,
                children: OnceCell::new(),
            }),
        }
    }

    /// Symbol id of the node. For a missing node, the id of the symbol
    /// that was missing.
    pub fn kind_id(&self) -> SymbolId {
        match &self.raw.green {
            NodeOrToken::Node(node) if node.kind().0 == grammar::MISSING => node
                .children()
                .next()
                .map_or(grammar::MISSING, |inner| match inner {
                    NodeOrToken::Node(n) => n.kind().0,
                    NodeOrToken::Token(t) => t.kind().0,
                }),
            green => raw_kind(green),
        }
    }

    /// Symbol name: the production name for named nodes, the literal text
    /// for anonymous ones.
    pub fn kind(&self) -> &str {
        self.tree.grammar.symbol_name(self.kind_id()).unwrap_or("ERROR")
    }

    pub fn is_named(&self) -> bool {
        self.tree.grammar.symbol_is_named(self.kind_id())
    }

    /// Zero-width node inserted by error recovery.
    pub fn is_missing(&self) -> bool {
        raw_kind(&self.raw.green) == grammar::MISSING
    }

    pub fn is_error(&self) -> bool {
        self.kind_id() == grammar::ERROR
    }

    /// Extras (comments and the like) may appear anywhere in the tree.
    pub fn is_extra(&self) -> bool {
        self.tree.grammar.is_extra(self.kind_id())
    }

    /// Whether this node is or contains an `ERROR` or `MISSING` node.
    pub fn has_error(&self) -> bool {
        match &self.raw.green {
            NodeOrToken::Node(node) => {
                matches!(node.kind().0, grammar::ERROR | grammar::MISSING) || green_has_error(node)
            }
            NodeOrToken::Token(token) => token.kind().0 == grammar::ERROR,
        }
    }

    pub fn start_byte(&self) -> usize {
        self.raw.start
    }

    pub fn end_byte(&self) -> usize {
        self.raw.end
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.raw.start..self.raw.end
    }

    pub fn text_range(&self) -> TextRange {
        TextRange::new(
            TextSize::new(self.raw.start as u32),
            TextSize::new(self.raw.end as u32),
        )
    }

    pub fn start_point(&self) -> Point {
        self.tree.point(self.raw.start)
    }

    pub fn end_point(&self) -> Point {
        self.tree.point(self.raw.end)
    }

    /// Source text covered by the node.
    pub fn text(&self) -> &str {
        &self.tree.text[self.byte_range()]
    }

    /// Child views in source order, anonymous tokens included.
    pub fn children(&self) -> Arc<[Node]> {
        self.raw
            .children
            .get_or_init(|| {
                let mut raw_children = Vec::new();
                let green = self.raw.green.as_node().filter(|g| g.kind().0 != grammar::MISSING);
                if let Some(green) = green {
                    collect_visible(
                        &self.tree,
                        green,
                        self.raw.offset,
                        &Arc::downgrade(&self.raw),
                        &mut raw_children,
                    );
                }
                raw_children
                    .into_iter()
                    .map(|raw| Node {
                        tree: self.tree.clone(),
                        raw,
                    })
                    .collect()
            })
            .clone()
    }

    pub fn child(&self, index: usize) -> Option<Node> {
        self.children().get(index).cloned()
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn named_children(&self) -> Vec<Node> {
        self.children().iter().filter(|c| c.is_named()).cloned().collect()
    }

    pub fn named_child(&self, index: usize) -> Option<Node> {
        self.children().iter().filter(|c| c.is_named()).nth(index).cloned()
    }

    pub fn named_child_count(&self) -> usize {
        self.children().iter().filter(|c| c.is_named()).count()
    }

    /// The parent view. `None` for the root, and once the tree and every
    /// handle to an ancestor have been dropped.
    pub fn parent(&self) -> Option<Node> {
        self.raw.parent.upgrade().map(|raw| Node {
            tree: self.tree.clone(),
            raw,
        })
    }

    fn sibling(&self, forward: bool, named: bool) -> Option<Node> {
        let siblings = self.parent()?.children();
        let index = self.raw.index;
        let found = if forward {
            siblings.get(index + 1..)?.iter().find(|s| !named || s.is_named())
        } else {
            siblings.get(..index)?.iter().rev().find(|s| !named || s.is_named())
        };
        found.cloned()
    }

    pub fn next_sibling(&self) -> Option<Node> {
        self.sibling(true, false)
    }

    pub fn prev_sibling(&self) -> Option<Node> {
        self.sibling(false, false)
    }

    pub fn next_named_sibling(&self) -> Option<Node> {
        self.sibling(true, true)
    }

    pub fn prev_named_sibling(&self) -> Option<Node> {
        self.sibling(false, true)
    }

    /// Smallest node whose range contains `start..end`.
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Node> {
        if start > end || start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut current = self.clone();
        'descend: loop {
            for child in current.children().iter() {
                if child.start_byte() <= start
                    && end <= child.end_byte()
                    && (child.start_byte() < child.end_byte() || start == end)
                {
                    current = child.clone();
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Address of the node's shared green storage. Stable across trees for
    /// subtrees an incremental parse reused.
    pub fn id(&self) -> usize {
        match &self.raw.green {
            NodeOrToken::Node(node) => green_key(node),
            NodeOrToken::Token(token) => {
                let data: &GreenTokenData = token;
                (data as *const GreenTokenData).cast::<()>() as usize
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.raw, &other.raw)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.raw).hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            write!(f, "MISSING ")?;
        }
        write!(f, "{} @ {}..{}", self.kind(), self.raw.start, self.raw.end)
    }
}
