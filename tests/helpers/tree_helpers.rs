//! Parsing shortcuts and whole-tree walks.

use std::ops::Range;
use std::sync::Arc;

use arbor::{Grammar, Node, Parser, Tree};

pub fn parser_for(grammar: &Arc<Grammar>) -> Parser {
    let mut parser = Parser::new();
    parser.set_language(grammar);
    parser
}

pub fn parse(grammar: &Arc<Grammar>, text: &str) -> Tree {
    parser_for(grammar)
        .parse(text)
        .unwrap_or_else(|err| panic!("parse of {text:?} failed: {err}"))
}

/// Every node below and including `node`, in pre-order.
pub fn descendants(node: &Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        for child in current.children().iter().rev() {
            stack.push(child.clone());
        }
        out.push(current);
    }
    out
}

/// `(kind, byte range)` of every node, in pre-order.
pub fn spans(tree: &Tree) -> Vec<(String, Range<usize>)> {
    descendants(&tree.root_node())
        .iter()
        .map(|node| (node.kind().to_string(), node.byte_range()))
        .collect()
}

pub fn find_kind(tree: &Tree, kind: &str) -> Option<Node> {
    descendants(&tree.root_node()).into_iter().find(|n| n.kind() == kind)
}
