use arbor::{ParseOptions, Parser};
use rstest::rstest;

use crate::helpers::grammars::{ambiguous, dynamic};
use crate::helpers::tree_helpers::{descendants, parse};

const LEFT: &str = "(program (sum (sum (number) (number)) (number)))";
const RIGHT: &str = "(program (sum (number) (sum (number) (number))))";

#[test]
fn test_ambiguous_sum_is_deterministic() {
    let first = parse(&ambiguous(), "1 + 2 + 3").root_node().to_sexp();
    assert!(first == LEFT || first == RIGHT, "unexpected parse {first}");
    for _ in 0..5 {
        assert_eq!(parse(&ambiguous(), "1 + 2 + 3").root_node().to_sexp(), first);
    }
}

#[test]
fn test_ambiguous_sum_has_no_errors() {
    let source = "1 + 2 + 3 + 4 + 5 + 6";
    let tree = parse(&ambiguous(), source);
    let root = tree.root_node();
    assert!(!root.has_error(), "{}", root.to_sexp());
    assert_eq!(root.end_byte(), source.len());
    let numbers = descendants(&root).iter().filter(|n| n.kind() == "number").count();
    assert_eq!(numbers, 6);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(6)]
fn test_version_cap_still_parses(#[case] max_versions: usize) {
    let mut parser = Parser::with_options(ParseOptions::default().with_max_versions(max_versions));
    parser.set_language(&ambiguous());
    let tree = parser.parse("1 + 2 + 3 + 4").unwrap();
    assert!(!tree.root_node().has_error());
    assert_eq!(tree.root_node().end_byte(), 13);
}

#[rstest]
#[case(1, "(program (second (word) (word)))")]
#[case(-1, "(program (first (word) (word)))")]
fn test_dynamic_precedence_picks_parse(#[case] precedence: i32, #[case] expected: &str) {
    let tree = parse(&dynamic(precedence), "alpha beta");
    assert_eq!(tree.root_node().to_sexp(), expected);
    assert_eq!(tree.root_node().child(0).unwrap().text(), "alpha beta");
}
