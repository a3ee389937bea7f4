//! Immutable syntax trees.
//!
//! A [`Tree`] owns a rowan green tree plus everything needed to interpret
//! it: the source text, the grammar (for symbol names), a line index, and
//! the bookkeeping a later incremental parse needs to reuse subtrees.
//!
//! Green nodes are position-independent and shared by `Arc`, so two trees
//! from successive incremental parses share every unchanged subtree.
//! [`Node`] is the positioned, navigable view over them.

mod node;
mod sexp;

use std::fmt;
use std::sync::Arc;

use rowan::GreenNode;
use rustc_hash::FxHashMap;

use crate::base::{ColumnEncoding, LineIndex, Point};
use crate::grammar::{Grammar, StateId, SymbolId};
use crate::lexer::ScannerState;

pub use node::Node;

/// rowan language over grammar symbol ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GrammarLanguage {}

impl rowan::Language for GrammarLanguage {
    type Kind = SymbolId;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.0
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind)
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<GrammarLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<GrammarLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<GrammarLanguage>;

/// Parse context a subtree was built in, recorded for incremental reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReuseInfo {
    /// State on top of the stack before the subtree's first token.
    pub state: StateId,
    pub scanner_before: ScannerState,
    pub scanner_after: ScannerState,
    /// How far past its start the subtree's lexing looked.
    pub lookahead_len: usize,
    pub dynamic_precedence: i32,
}

/// Reuse records keyed by green node address (see [`green_key`]).
pub(crate) type ReuseMap = FxHashMap<usize, ReuseInfo>;

/// Identity of a green node: the address of its shared storage.
pub(crate) fn green_key(node: &rowan::GreenNodeData) -> usize {
    (node as *const rowan::GreenNodeData).cast::<()>() as usize
}

pub(crate) struct TreeData {
    pub(crate) green: GreenNode,
    pub(crate) text: Arc<str>,
    pub(crate) grammar: Arc<Grammar>,
    pub(crate) lines: LineIndex,
    pub(crate) encoding: ColumnEncoding,
    pub(crate) reuse: ReuseMap,
}

impl TreeData {
    pub(crate) fn point(&self, offset: usize) -> Point {
        self.lines.point(&self.text, offset, self.encoding)
    }
}

/// The result of a parse. Cheap to clone; `Send + Sync`.
#[derive(Clone)]
pub struct Tree {
    data: Arc<TreeData>,
    root: Node,
}

impl Tree {
    pub(crate) fn new(
        green: GreenNode,
        text: Arc<str>,
        grammar: Arc<Grammar>,
        encoding: ColumnEncoding,
        reuse: ReuseMap,
    ) -> Self {
        let lines = LineIndex::new(&text);
        let data = Arc::new(TreeData {
            green,
            text,
            grammar,
            lines,
            encoding,
            reuse,
        });
        let root = Node::root(&data);
        Self { data, root }
    }

    pub fn root_node(&self) -> Node {
        self.root.clone()
    }

    pub fn text(&self) -> &str {
        &self.data.text
    }

    pub fn language(&self) -> &Arc<Grammar> {
        &self.data.grammar
    }

    pub fn column_encoding(&self) -> ColumnEncoding {
        self.data.encoding
    }

    /// The raw green tree, hidden nodes and trivia included.
    pub fn green(&self) -> &GreenNode {
        &self.data.green
    }

    /// A rowan cursor over the raw green tree, for single-threaded traversal.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.data.green.clone())
    }

    pub(crate) fn reuse_info(&self, node: &rowan::GreenNodeData) -> Option<&ReuseInfo> {
        self.data.reuse.get(&green_key(node))
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("language", &self.data.grammar.name())
            .field("root", &self.root)
            .finish()
    }
}
