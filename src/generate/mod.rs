//! Table generator.
//!
//! Builds [`LanguageTables`] from rule combinators, so compiled units can
//! be produced without an external toolchain. The parser never depends on
//! this module; it only reads the tables.
//!
//! ```ignore
//! use arbor::generate::*;
//!
//! let tables = GrammarBuilder::new("list")
//!     .rule("list", seq([lit("["), repeat(sym("item")), lit("]")]))
//!     .rule("item", pat("[a-z]+"))
//!     .extra(pat(r"\s+"))
//!     .build()?;
//! ```
//!
//! Conventions:
//! - the first rule is the start symbol
//! - a rule whose body is a single literal or pattern is a token
//! - names starting with `_` are hidden
//! - literals inside rules become anonymous tokens, inline patterns hidden ones

mod error;
mod expand;
mod lalr;
mod rules;

use indexmap::IndexMap;

use crate::grammar::{LanguageTables, ProductionInfo};

pub use error::GenerateError;
pub use rules::{
    Assoc, Rule, blank, choice, lit, optional, pat, prec, prec_dynamic, prec_left, prec_right,
    repeat, repeat1, sep1, seq, sym,
};

/// Collects rules and emits tables.
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    name: String,
    rules: IndexMap<String, Rule>,
    extras: Vec<Rule>,
    externals: Vec<String>,
    external_scanner: Option<String>,
}

impl GrammarBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: IndexMap::new(),
            extras: Vec::new(),
            externals: Vec::new(),
            external_scanner: None,
        }
    }

    /// Define (or redefine) a rule. The first rule defined is the start.
    pub fn rule(mut self, name: &str, rule: Rule) -> Self {
        self.rules.insert(name.to_string(), rule);
        self
    }

    /// Text allowed between any two tokens (whitespace, comments).
    pub fn extra(mut self, rule: Rule) -> Self {
        self.extras.push(rule);
        self
    }

    /// A token produced by the external scanner. Order matters: it is the
    /// index the scanner reports.
    pub fn external(mut self, name: &str) -> Self {
        self.externals.push(name.to_string());
        self
    }

    pub fn external_scanner(mut self, name: &str) -> Self {
        self.external_scanner = Some(name.to_string());
        self
    }

    pub fn build(&self) -> Result<LanguageTables, GenerateError> {
        let flat = expand::flatten(&self.name, &self.rules, &self.extras, &self.externals)?;
        let (states, lex_modes) = lalr::TableBuilder::new(&flat).build()?;

        let productions = flat
            .productions
            .iter()
            .map(|p| ProductionInfo {
                lhs: p.lhs,
                child_count: p.rhs.len() as u16,
                dynamic_precedence: p.dynamic_precedence,
            })
            .collect();

        tracing::debug!(
            grammar = %self.name,
            symbols = flat.symbols.len(),
            states = states.len(),
            "generated tables"
        );

        Ok(LanguageTables {
            name: self.name.clone(),
            symbols: flat.symbols,
            tokens: flat.tokens,
            extras: flat.extras,
            externals: flat.externals,
            external_scanner: self.external_scanner.clone(),
            productions,
            states,
            lex_modes,
        })
    }
}
