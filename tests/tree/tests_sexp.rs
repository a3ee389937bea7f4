use rstest::rstest;

use crate::helpers::grammars::{javascript, python};
use crate::helpers::tree_helpers::parse;

#[rstest]
#[case("x;", "(program (expression_statement (identifier)))")]
#[case("return;", "(program (return_statement))")]
#[case("{ }", "(program (statement_block))")]
#[case("a.b;", "(program (expression_statement (member_expression (identifier) (identifier))))")]
#[case(
    "f(1, x);",
    "(program (expression_statement (call_expression (identifier) (arguments (number) (identifier)))))"
)]
fn test_javascript_sexp(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(parse(&javascript(), source).root_node().to_sexp(), expected);
}

#[rstest]
#[case("x = 1\n", "(module (expression_statement (assignment (identifier) (integer))))")]
#[case("f(1, 2)\n", "(module (expression_statement (call (identifier) (argument_list (integer) (integer)))))")]
#[case("1 + 2\n", "(module (expression_statement (binary_operator (integer) (integer))))")]
fn test_python_sexp(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(parse(&python(), source).root_node().to_sexp(), expected);
}

#[test]
fn test_anonymous_nodes_render_quoted() {
    let tree = parse(&javascript(), "f();");
    let statement = tree.root_node().child(0).unwrap();
    let semicolon = statement.child(1).unwrap();
    assert!(!semicolon.is_named());
    assert_eq!(semicolon.to_sexp(), "(\";\")");
}

#[test]
fn test_sexp_is_stable() {
    let source = "function f(a) { if (a) return a * 2; }";
    let first = parse(&javascript(), source).root_node().to_sexp();
    let second = parse(&javascript(), source).root_node().to_sexp();
    assert_eq!(first, second);
    assert_eq!(
        first,
        "(program (function (identifier) (formal_parameters (identifier)) (statement_block \
         (if_statement (identifier) (return_statement (binary_expression (identifier) (number)))))))"
    );
}
