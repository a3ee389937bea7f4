use std::sync::Arc;

use arbor::{Grammar, InputEdit};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use crate::helpers::grammars::{javascript, python};
use crate::helpers::tree_helpers::{descendants, parser_for, spans};

const STATEMENTS: &[&str] = &[
    "a();",
    "b.c(1, 2);",
    "x + y * z;",
    "return;",
    "return n;",
    "{ f(); }",
    "if (a) b(); else c();",
    "function g(p, q) { return p + q; }",
    "// note",
];

fn program(indices: &[usize]) -> String {
    indices.iter().map(|&i| format!("{}\n", STATEMENTS[i])).collect()
}

/// Byte offset of the start of each line.
fn line_starts(indices: &[usize]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(indices.len() + 1);
    let mut offset = 0;
    for &i in indices {
        starts.push(offset);
        offset += STATEMENTS[i].len() + 1;
    }
    starts.push(offset);
    starts
}

#[test]
fn test_untouched_function_is_reused() {
    let grammar = javascript();
    let mut parser = parser_for(&grammar);
    let old_text = "function f() {\n  g();\n}\nh();\nx();\n";
    let old = parser.parse(old_text).unwrap();

    let new_text = "function f() {\n  g();\n}\nh();\nxyz();\n";
    let x = old_text.find("x()").unwrap();
    let new = parser
        .parse_with(new_text, &old, &[InputEdit::new(x, x + 1, x + 3)])
        .unwrap();
    let fresh = parser.parse(new_text).unwrap();

    assert_eq!(new.root_node().to_sexp(), fresh.root_node().to_sexp());
    assert_eq!(spans(&new), spans(&fresh));

    let old_function = old.root_node().child(0).unwrap();
    let new_function = new.root_node().child(0).unwrap();
    assert_eq!(new_function.kind(), "function");
    assert_eq!(old_function.id(), new_function.id());
    assert_ne!(fresh.root_node().child(0).unwrap().id(), new_function.id());
}

#[test]
fn test_previous_tree_is_unchanged() {
    let grammar = javascript();
    let mut parser = parser_for(&grammar);
    let old = parser.parse("a();\nb();\n").unwrap();
    let before = old.root_node().to_sexp();

    let first = parser.parse_with("a();\nb(1);\n", &old, &[InputEdit::new(7, 7, 8)]).unwrap();
    let second = parser.parse_with("a(2);\nb();\n", &old, &[InputEdit::new(2, 2, 3)]).unwrap();

    assert_eq!(old.root_node().to_sexp(), before);
    assert_eq!(old.text(), "a();\nb();\n");
    assert_eq!(first.text(), "a();\nb(1);\n");
    assert_eq!(second.root_node().child(0).unwrap().text(), "a(2);");
}

#[test]
fn test_edits_apply_in_sequence() {
    let grammar = javascript();
    let mut parser = parser_for(&grammar);
    let old = parser.parse("a();\nb();\nc();\n").unwrap();

    // The second edit is expressed in the text the first one produced.
    let edits = [InputEdit::new(0, 1, 2), InputEdit::new(11, 12, 13)];
    let new_text = "aa();\nb();\ncc();\n";
    let new = parser.parse_with(new_text, &old, &edits).unwrap();
    let fresh = parser.parse(new_text).unwrap();

    assert_eq!(new.root_node().to_sexp(), fresh.root_node().to_sexp());
    assert_eq!(spans(&new), spans(&fresh));
}

#[test]
fn test_edit_introducing_error_matches_fresh_parse() {
    let grammar = javascript();
    let mut parser = parser_for(&grammar);
    let old_text = "a();\nb();\nc();\nd();\n";
    let old = parser.parse(old_text).unwrap();

    let new_text = "a();\nb();\nc(;\nd();\n";
    let new = parser.parse_with(new_text, &old, &[InputEdit::new(12, 13, 12)]).unwrap();
    let fresh = parser.parse(new_text).unwrap();

    assert!(new.root_node().has_error());
    assert_eq!(new.root_node().to_sexp(), fresh.root_node().to_sexp());
    assert_eq!(spans(&new), spans(&fresh));
}

#[test]
fn test_edit_before_recovered_keyword_matches_fresh_parse() {
    let grammar = javascript();
    let mut parser = parser_for(&grammar);
    // The dangling `else` at the end is wrapped in an error; the if
    // statement before it only closes once that error is in place.
    let old_text = "return;else a();if (a) \na();\n\nelse ";
    let old = parser.parse(old_text).unwrap();

    let new_text = "return;el);if (a) \na();\n\nelse ";
    let new = parser.parse_with(new_text, &old, &[InputEdit::new(9, 14, 9)]).unwrap();
    let fresh = parser.parse(new_text).unwrap();

    assert_eq!(new.root_node().to_sexp(), fresh.root_node().to_sexp());
    assert_eq!(spans(&new), spans(&fresh));
    let else_identifiers = descendants(&new.root_node())
        .into_iter()
        .filter(|n| n.kind() == "identifier" && n.text() == "else")
        .count();
    assert_eq!(else_identifiers, 0, "{}", new.root_node().to_sexp());
}

#[test]
fn test_python_block_edit_matches_fresh_parse() {
    let grammar = python();
    let mut parser = parser_for(&grammar);
    let old_text = "def f():\n  a = 1\n  b(a)\nc = 2\n";
    let old = parser.parse(old_text).unwrap();

    let new_text = "def f():\n  a = 10\n  b(a)\nc = 2\n";
    let one = old_text.find('1').unwrap();
    let new = parser
        .parse_with(new_text, &old, &[InputEdit::new(one + 1, one + 1, one + 2)])
        .unwrap();
    let fresh = parser.parse(new_text).unwrap();

    assert!(!new.root_node().has_error(), "{}", new.root_node().to_sexp());
    assert_eq!(new.root_node().to_sexp(), fresh.root_node().to_sexp());
    assert_eq!(spans(&new), spans(&fresh));
}

#[derive(Debug, Clone)]
enum LineEdit {
    Replace { line: usize, with: usize },
    Insert { line: usize, with: usize },
    Delete { line: usize },
}

fn line_edit() -> impl Strategy<Value = LineEdit> {
    let line = 0usize..16;
    let with = 0..STATEMENTS.len();
    prop_oneof![
        (line.clone(), with.clone()).prop_map(|(line, with)| LineEdit::Replace { line, with }),
        (line.clone(), with).prop_map(|(line, with)| LineEdit::Insert { line, with }),
        line.prop_map(|line| LineEdit::Delete { line }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_incremental_matches_fresh_parse(
        lines in prop::collection::vec(0..STATEMENTS.len(), 1..8),
        edit in line_edit(),
    ) {
        let grammar = javascript();
        let mut parser = parser_for(&grammar);
        let old_text = program(&lines);
        let old = parser.parse(&old_text).unwrap();
        let starts = line_starts(&lines);

        let mut new_lines = lines.clone();
        let input_edit = match edit {
            LineEdit::Replace { line, with } => {
                let line = line % lines.len();
                new_lines[line] = with;
                let start = starts[line];
                InputEdit::new(start, start + STATEMENTS[lines[line]].len(), start + STATEMENTS[with].len())
            }
            LineEdit::Insert { line, with } => {
                let line = line % (lines.len() + 1);
                new_lines.insert(line, with);
                let start = starts[line];
                InputEdit::new(start, start, start + STATEMENTS[with].len() + 1)
            }
            LineEdit::Delete { line } => {
                let line = line % lines.len();
                new_lines.remove(line);
                let start = starts[line];
                InputEdit::new(start, starts[line + 1], start)
            }
        };
        let new_text = program(&new_lines);

        let new = parser.parse_with(&new_text, &old, &[input_edit]).unwrap();
        let fresh = parser.parse(&new_text).unwrap();
        prop_assert_eq!(new.text(), new_text.as_str());
        prop_assert_eq!(new.root_node().to_sexp(), fresh.root_node().to_sexp());
        prop_assert_eq!(spans(&new), spans(&fresh));
    }
}

const JS_PIECES: &[&str] = &[
    "a", "b", "(", ")", ";", "{", "}", " ", "\n", "if", "else", "return", "function", ".", "+", "*", "1", ",",
    "#", "// c",
];

const PY_PIECES: &[&str] = &[
    "a", "b", "(", ")", ":", "=", " ", "  ", "\n", "def", "+", "*", "1", ",", "#", "x",
];

fn pieces(alphabet: &'static [&'static str], max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(alphabet), 0..max).prop_map(|parts| parts.concat())
}

/// Replace `removed` bytes at `start` of `old_text` by `inserted`, then
/// compare the incremental parse with a fresh one.
fn check_edit(
    grammar: &Arc<Grammar>,
    old_text: &str,
    start: prop::sample::Index,
    removed: usize,
    inserted: &str,
) -> Result<(), TestCaseError> {
    let start = start.index(old_text.len() + 1);
    let old_end = (start + removed).min(old_text.len());
    let new_text = format!("{}{}{}", &old_text[..start], inserted, &old_text[old_end..]);
    let edit = InputEdit::new(start, old_end, start + inserted.len());

    let mut parser = parser_for(grammar);
    let old = parser.parse(old_text).unwrap();
    let new = parser.parse_with(&new_text, &old, &[edit]).unwrap();
    let fresh = parser.parse(&new_text).unwrap();
    prop_assert_eq!(new.text(), new_text.as_str());
    prop_assert_eq!(new.root_node().to_sexp(), fresh.root_node().to_sexp());
    prop_assert_eq!(spans(&new), spans(&fresh));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_javascript_character_edit_matches_fresh_parse(
        old_text in pieces(JS_PIECES, 24),
        start in any::<prop::sample::Index>(),
        removed in 0usize..6,
        inserted in pieces(JS_PIECES, 3),
    ) {
        check_edit(&javascript(), &old_text, start, removed, &inserted)?;
    }

    #[test]
    fn prop_python_character_edit_matches_fresh_parse(
        old_text in pieces(PY_PIECES, 24),
        start in any::<prop::sample::Index>(),
        removed in 0usize..6,
        inserted in pieces(PY_PIECES, 3),
    ) {
        check_edit(&python(), &old_text, start, removed, &inserted)?;
    }
}
