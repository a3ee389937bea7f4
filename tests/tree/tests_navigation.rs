use std::sync::Arc;

use crate::helpers::grammars::{javascript, python};
use crate::helpers::source_fixtures::*;
use crate::helpers::tree_helpers::{descendants, find_kind, parse};

#[test]
fn test_children_are_shared() {
    let tree = parse(&python(), PY_FUNCTION);
    let function = tree.root_node().child(0).unwrap();

    let first = function.children();
    let second = function.children();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), function.child_count());
}

#[test]
fn test_parent_links() {
    let tree = parse(&python(), PY_FUNCTION);
    let root = tree.root_node();
    assert!(root.parent().is_none());

    for node in descendants(&root).iter().skip(1) {
        let parent = node.parent().expect("every non-root node has a parent");
        assert!(
            parent.children().iter().any(|c| c.id() == node.id() && c.byte_range() == node.byte_range()),
            "{} is not among its parent's children",
            node.kind()
        );
    }

    let call = find_kind(&tree, "call").unwrap();
    assert_eq!(call.parent().unwrap().kind(), "expression_statement");
    assert_eq!(call.parent().unwrap().parent().unwrap().kind(), "function_definition");
}

#[test]
fn test_siblings() {
    let tree = parse(&python(), PY_FUNCTION);
    let function = tree.root_node().child(0).unwrap();
    let name = function.child(1).unwrap();

    assert_eq!(name.prev_sibling().unwrap().kind(), "def");
    assert_eq!(name.next_sibling().unwrap().kind(), "parameters");
    assert!(name.prev_named_sibling().is_none());
    assert_eq!(name.next_named_sibling().unwrap().kind(), "parameters");

    let body = function.child(4).unwrap();
    assert!(body.next_sibling().is_none());
    assert_eq!(body.prev_sibling().unwrap().kind(), ":");
    assert_eq!(body.prev_named_sibling().unwrap().kind(), "parameters");
}

#[test]
fn test_named_children() {
    let tree = parse(&javascript(), "f(a, 1, g());");
    let arguments = find_kind(&tree, "arguments").unwrap();
    assert_eq!(arguments.child_count(), 7);
    assert_eq!(arguments.named_child_count(), 3);
    let kinds: Vec<_> = arguments.named_children().iter().map(|c| c.kind().to_string()).collect();
    assert_eq!(kinds, ["identifier", "number", "call_expression"]);
    assert_eq!(arguments.named_child(1).unwrap().text(), "1");
    assert!(arguments.named_child(3).is_none());
}

#[test]
fn test_parent_survives_dropped_tree_handle() {
    let tree = parse(&javascript(), JS_FUNCTION);
    let root = tree.root_node();
    let block = find_kind(&tree, "statement_block").unwrap();
    drop(tree);
    assert_eq!(block.parent().unwrap().kind(), "function");
    assert_eq!(root.kind(), "program");
}

#[test]
fn test_descendant_for_byte_range() {
    let tree = parse(&python(), PY_FUNCTION);
    let root = tree.root_node();
    let bar = PY_FUNCTION.find("bar").unwrap();

    let node = root.descendant_for_byte_range(bar, bar + 3).unwrap();
    assert_eq!(node.kind(), "identifier");
    assert_eq!(node.text(), "bar");

    let node = root.descendant_for_byte_range(bar, bar + 5).unwrap();
    assert_eq!(node.kind(), "call");

    assert!(root.descendant_for_byte_range(0, PY_FUNCTION.len() + 1).is_none());
}

#[test]
fn test_tree_is_shareable_across_threads() {
    let tree = parse(&javascript(), JS_PROGRAM);
    let expected = tree.root_node().to_sexp();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let tree = tree.clone();
            std::thread::spawn(move || tree.root_node().to_sexp())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
