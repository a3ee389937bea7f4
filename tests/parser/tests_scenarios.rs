use arbor::Point;
use rstest::rstest;

use crate::helpers::grammars::{javascript, python};
use crate::helpers::source_fixtures::*;
use crate::helpers::tree_helpers::{parse, parser_for};

#[test]
fn test_python_function() {
    let tree = parse(&python(), PY_FUNCTION);
    let root = tree.root_node();

    assert_eq!(root.kind(), "module");
    assert_eq!(root.end_byte(), 18);
    assert_eq!(root.end_point(), Point::new(1, 7));
    assert_eq!(
        root.to_sexp(),
        "(module (function_definition (identifier) (parameters) \
         (expression_statement (call (identifier) (argument_list)))))"
    );
    assert!(!root.has_error());
}

#[test]
fn test_python_function_children() {
    let tree = parse(&python(), PY_FUNCTION);
    let function = tree.root_node().child(0).unwrap();
    assert_eq!(function.kind(), "function_definition");

    let children = function.children();
    let kinds: Vec<_> = children.iter().map(|c| c.kind()).collect();
    let named: Vec<_> = children.iter().map(|c| c.is_named()).collect();
    assert_eq!(kinds, ["def", "identifier", "parameters", ":", "expression_statement"]);
    assert_eq!(named, [false, true, true, false, true]);

    assert_eq!(children[1].text(), "foo");
    assert_eq!(children[4].text(), "bar()");
    assert_eq!(children[4].start_point(), Point::new(1, 2));
}

#[test]
fn test_python_nested_blocks() {
    let tree = parse(&python(), PY_NESTED);
    let root = tree.root_node();
    assert!(!root.has_error(), "{}", root.to_sexp());
    assert_eq!(root.end_byte(), PY_NESTED.len());
    assert_eq!(
        root.to_sexp(),
        "(module \
         (function_definition (identifier) (parameters (identifier) (identifier)) \
         (expression_statement (assignment (identifier) (identifier))) \
         (function_definition (identifier) (parameters) \
         (expression_statement (call (identifier) (argument_list (identifier) (identifier))))) \
         (expression_statement (call (identifier) (argument_list)))) \
         (expression_statement (assignment (identifier) \
         (binary_operator (integer) (binary_operator (integer) (integer))))))"
    );
}

#[test]
fn test_python_comments_are_visible_extras() {
    let tree = parse(&python(), PY_COMMENTED);
    let root = tree.root_node();
    assert!(!root.has_error(), "{}", root.to_sexp());
    assert_eq!(
        root.to_sexp(),
        "(module (comment) (expression_statement (assignment (identifier) (integer))) (comment))"
    );
    let comments: Vec<_> = root
        .children()
        .iter()
        .filter(|c| c.kind() == "comment")
        .map(|c| c.is_extra())
        .collect();
    assert_eq!(comments, [true, true]);
}

#[test]
fn test_switching_language_on_one_parser() {
    let mut parser = parser_for(&python());
    let first = parser.parse(PY_FUNCTION).unwrap();
    assert_eq!(first.root_node().kind(), "module");

    parser.set_language(&javascript());
    let tree = parser.parse(JS_FUNCTION).unwrap();
    assert_eq!(
        tree.root_node().to_sexp(),
        "(program (function (identifier) (formal_parameters) (statement_block \
         (expression_statement (call_expression (identifier) (arguments))))))"
    );
    assert_eq!(parser.language().unwrap().name(), "javascript");
}

#[test]
fn test_javascript_program() {
    let tree = parse(&javascript(), JS_PROGRAM);
    let root = tree.root_node();
    assert!(!root.has_error(), "{}", root.to_sexp());
    assert_eq!(
        root.to_sexp(),
        "(program \
         (function (identifier) (formal_parameters (identifier) (identifier)) \
         (statement_block (return_statement (binary_expression (identifier) (identifier))))) \
         (comment) \
         (if_statement (identifier) \
         (statement_block (expression_statement (call_expression \
         (member_expression (identifier) (identifier)) \
         (arguments (call_expression (identifier) (arguments (number) (number))))))) \
         (expression_statement (call_expression (identifier) (arguments)))))"
    );
}

#[rstest]
#[case("a + b * c;", "(binary_expression (identifier) (binary_expression (identifier) (identifier)))")]
#[case("a * b + c;", "(binary_expression (binary_expression (identifier) (identifier)) (identifier))")]
#[case("a + b + c;", "(binary_expression (binary_expression (identifier) (identifier)) (identifier))")]
#[case("a.b(c);", "(call_expression (member_expression (identifier) (identifier)) (arguments (identifier)))")]
fn test_javascript_precedence(#[case] source: &str, #[case] expected: &str) {
    let tree = parse(&javascript(), source);
    let expression = tree.root_node().child(0).unwrap().child(0).unwrap();
    assert_eq!(expression.to_sexp(), expected);
}

#[test]
fn test_dangling_else_binds_to_inner_if() {
    let tree = parse(&javascript(), "if (a) if (b) c(); else d();");
    assert_eq!(
        tree.root_node().to_sexp(),
        "(program (if_statement (identifier) (if_statement (identifier) \
         (expression_statement (call_expression (identifier) (arguments))) \
         (expression_statement (call_expression (identifier) (arguments))))))"
    );
}

#[rstest]
#[case("")]
#[case("   \n\n ")]
#[case("// only a comment")]
fn test_javascript_without_statements(#[case] source: &str) {
    let tree = parse(&javascript(), source);
    let root = tree.root_node();
    assert_eq!(root.kind(), "program");
    assert_eq!(root.end_byte(), source.len());
    assert!(!root.has_error());
    assert_eq!(root.named_children().iter().filter(|c| c.kind() != "comment").count(), 0);
}
