//! Fixture grammars, generated once per test binary.

use std::sync::Arc;

use arbor::generate::*;
use arbor::grammar::{CompiledUnit, LanguageTables};
use arbor::{Grammar, Registry};
use once_cell::sync::Lazy;

/// Offside-rule language in the style of Python.
pub fn python_tables() -> LanguageTables {
    GrammarBuilder::new("python")
        .rule("module", repeat(sym("_statement")))
        .rule("_statement", choice([sym("_simple_statement"), sym("function_definition")]))
        .rule("_simple_statement", seq([sym("expression_statement"), sym("_newline")]))
        .rule(
            "function_definition",
            seq([
                lit("def"),
                sym("identifier"),
                sym("parameters"),
                lit(":"),
                sym("_suite"),
            ]),
        )
        .rule(
            "_suite",
            choice([
                seq([
                    sym("_newline"),
                    sym("_indent"),
                    repeat1(sym("_statement")),
                    sym("_dedent"),
                ]),
                sym("_simple_statement"),
            ]),
        )
        .rule(
            "parameters",
            seq([lit("("), optional(sep1(sym("identifier"), lit(","))), lit(")")]),
        )
        .rule("expression_statement", choice([sym("_expression"), sym("assignment")]))
        .rule("assignment", seq([sym("identifier"), lit("="), sym("_expression")]))
        .rule(
            "_expression",
            choice([
                sym("_primary"),
                sym("integer"),
                sym("binary_operator"),
            ]),
        )
        .rule("_primary", choice([sym("identifier"), sym("call")]))
        .rule("call", prec(10, seq([sym("_primary"), sym("argument_list")])))
        .rule(
            "argument_list",
            seq([lit("("), optional(sep1(sym("_expression"), lit(","))), lit(")")]),
        )
        .rule(
            "binary_operator",
            choice([
                prec_left(1, seq([sym("_expression"), lit("+"), sym("_expression")])),
                prec_left(2, seq([sym("_expression"), lit("*"), sym("_expression")])),
            ]),
        )
        .rule("identifier", pat("[A-Za-z_][A-Za-z0-9_]*"))
        .rule("integer", pat("[0-9]+"))
        .rule("comment", pat("#[^\n]*"))
        .extra(pat(r"[ \t\r\n]+"))
        .extra(sym("comment"))
        .external("_newline")
        .external("_indent")
        .external("_dedent")
        .external_scanner("indent")
        .build()
        .expect("python fixture grammar")
}

/// Brace-delimited language in the style of JavaScript.
pub fn javascript_tables() -> LanguageTables {
    GrammarBuilder::new("javascript")
        .rule("program", repeat(sym("_statement")))
        .rule(
            "_statement",
            choice([
                sym("function"),
                sym("expression_statement"),
                sym("statement_block"),
                sym("if_statement"),
                sym("return_statement"),
            ]),
        )
        .rule(
            "function",
            seq([
                lit("function"),
                sym("identifier"),
                sym("formal_parameters"),
                sym("statement_block"),
            ]),
        )
        .rule(
            "formal_parameters",
            seq([lit("("), optional(sep1(sym("identifier"), lit(","))), lit(")")]),
        )
        .rule("statement_block", seq([lit("{"), repeat(sym("_statement")), lit("}")]))
        .rule("expression_statement", seq([sym("_expression"), lit(";")]))
        .rule(
            "if_statement",
            prec_right(
                0,
                seq([
                    lit("if"),
                    lit("("),
                    sym("_expression"),
                    lit(")"),
                    sym("_statement"),
                    optional(seq([lit("else"), sym("_statement")])),
                ]),
            ),
        )
        .rule("return_statement", seq([lit("return"), optional(sym("_expression")), lit(";")]))
        .rule(
            "_expression",
            choice([
                sym("identifier"),
                sym("number"),
                sym("call_expression"),
                sym("member_expression"),
                sym("binary_expression"),
            ]),
        )
        .rule("call_expression", prec(10, seq([sym("_expression"), sym("arguments")])))
        .rule(
            "member_expression",
            prec(11, seq([sym("_expression"), lit("."), sym("identifier")])),
        )
        .rule(
            "binary_expression",
            choice([
                prec_left(1, seq([sym("_expression"), lit("+"), sym("_expression")])),
                prec_left(2, seq([sym("_expression"), lit("*"), sym("_expression")])),
            ]),
        )
        .rule(
            "arguments",
            seq([lit("("), optional(sep1(sym("_expression"), lit(","))), lit(")")]),
        )
        .rule("identifier", pat("[A-Za-z_$][A-Za-z0-9_$]*"))
        .rule("number", pat("[0-9]+"))
        .rule("comment", pat("//[^\n]*"))
        .extra(pat(r"\s+"))
        .extra(sym("comment"))
        .build()
        .expect("javascript fixture grammar")
}

/// `1 + 2 + 3` has two parses; nothing resolves the conflict statically.
pub fn ambiguous_tables() -> LanguageTables {
    GrammarBuilder::new("ambiguous")
        .rule("program", sym("_expression"))
        .rule("_expression", choice([sym("number"), sym("sum")]))
        .rule("sum", seq([sym("_expression"), lit("+"), sym("_expression")]))
        .rule("number", pat("[0-9]+"))
        .extra(pat(r"\s+"))
        .build()
        .expect("ambiguous fixture grammar")
}

/// Two words parse as either `first` or `second`; only dynamic precedence
/// tells them apart.
pub fn dynamic_tables(second_precedence: i32) -> LanguageTables {
    GrammarBuilder::new("dynamic")
        .rule("program", choice([sym("first"), sym("second")]))
        .rule("first", seq([sym("word"), sym("word")]))
        .rule("second", prec_dynamic(second_precedence, seq([sym("word"), sym("word")])))
        .rule("word", pat("[a-z]+"))
        .extra(pat(r"\s+"))
        .build()
        .expect("dynamic precedence fixture grammar")
}

/// The unit holding both scenario languages.
pub static LANGUAGES: Lazy<CompiledUnit> =
    Lazy::new(|| CompiledUnit::new(vec![python_tables(), javascript_tables()]));

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub fn python() -> Arc<Grammar> {
    REGISTRY.load_unit(&LANGUAGES, "python").expect("python loads")
}

pub fn javascript() -> Arc<Grammar> {
    REGISTRY.load_unit(&LANGUAGES, "javascript").expect("javascript loads")
}

pub fn ambiguous() -> Arc<Grammar> {
    static GRAMMAR: Lazy<Arc<Grammar>> =
        Lazy::new(|| Arc::new(Grammar::from_tables(&ambiguous_tables(), |_| None).expect("ambiguous loads")));
    GRAMMAR.clone()
}

pub fn dynamic(second_precedence: i32) -> Arc<Grammar> {
    Arc::new(Grammar::from_tables(&dynamic_tables(second_precedence), |_| None).expect("dynamic loads"))
}
