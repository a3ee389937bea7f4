//! Symbol allocation and flattening of rules into productions.
//!
//! Ids are laid out as: `end`, token rules, anonymous literals, inline
//! patterns, externals, then non-terminals (named rules first, repeat
//! helpers after). Every id below `terminal_count` is a terminal.

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::grammar::{FIRST_RESERVED, SymbolId, SymbolInfo, SymbolType, TokenPattern, TokenRule};

use super::error::GenerateError;
use super::rules::{Assoc, Rule};

/// A flattened production. Index 0 is the augmented `start' -> start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlatProduction {
    pub lhs: SymbolId,
    pub rhs: Vec<SymbolId>,
    pub precedence: Option<(i32, Assoc)>,
    pub dynamic_precedence: i32,
}

#[derive(Debug)]
pub(crate) struct FlatGrammar {
    pub symbols: Vec<SymbolInfo>,
    pub tokens: Vec<TokenRule>,
    pub extras: Vec<SymbolId>,
    pub externals: Vec<SymbolId>,
    pub terminal_count: usize,
    pub productions: Vec<FlatProduction>,
}

#[derive(Debug, Clone, Default)]
struct Alt {
    symbols: Vec<SymbolId>,
    precedence: Option<(i32, Assoc)>,
    dynamic_precedence: i32,
}

impl Alt {
    fn then(&self, other: &Alt) -> Alt {
        let mut symbols = self.symbols.clone();
        symbols.extend_from_slice(&other.symbols);
        Alt {
            symbols,
            precedence: self.precedence.or(other.precedence),
            dynamic_precedence: self.dynamic_precedence + other.dynamic_precedence,
        }
    }
}

struct Flattener<'g> {
    symbols: Vec<SymbolInfo>,
    names: IndexMap<&'g str, SymbolId>,
    literals: IndexMap<&'g str, SymbolId>,
    patterns: IndexMap<&'g str, SymbolId>,
    tokens: Vec<TokenRule>,
    productions: IndexSet<(SymbolId, Vec<SymbolId>)>,
    metadata: Vec<(Option<(i32, Assoc)>, i32)>,
    current_rule: &'g str,
    repeat_count: usize,
}

pub(crate) fn flatten(
    name: &str,
    rules: &IndexMap<String, Rule>,
    extras: &[Rule],
    externals: &[String],
) -> Result<FlatGrammar, GenerateError> {
    let Some((start_name, start_rule)) = rules.first() else {
        return Err(GenerateError::EmptyGrammar(name.to_string()));
    };
    if start_rule.as_token().is_some() {
        return Err(GenerateError::TerminalStart(start_name.clone()));
    }

    let mut f = Flattener {
        symbols: vec![SymbolInfo {
            name: "end".to_string(),
            kind: SymbolType::Terminal,
            named: false,
            visible: false,
        }],
        names: IndexMap::new(),
        literals: IndexMap::new(),
        patterns: IndexMap::new(),
        tokens: Vec::new(),
        productions: IndexSet::new(),
        metadata: Vec::new(),
        current_rule: start_name.as_str(),
        repeat_count: 0,
    };

    for (rule_name, rule) in rules {
        if let Some(token) = rule.as_token() {
            let id = f.push_symbol(rule_name, SymbolType::Terminal, true, !rule_name.starts_with('_'));
            f.tokens.push(TokenRule {
                symbol: id,
                pattern: to_pattern(token)?,
            });
            f.names.insert(rule_name, id);
        }
    }
    for rule in rules.values().filter(|r| r.as_token().is_none()).chain(extras) {
        f.collect_leaves(rule)?;
    }

    let mut extra_ids = Vec::with_capacity(extras.len());
    for extra in extras {
        let id = match extra {
            Rule::String(text) => f.literals[text.as_str()],
            Rule::Pattern(source) => f.patterns[source.as_str()],
            Rule::Symbol(symbol) => match f.names.get(symbol.as_str()) {
                Some(&id) if f.symbols[usize::from(id)].kind == SymbolType::Terminal => id,
                _ => return Err(GenerateError::InvalidExtra(symbol.clone())),
            },
            other => return Err(GenerateError::InvalidExtra(format!("{other:?}"))),
        };
        extra_ids.push(id);
    }

    let mut external_ids = Vec::with_capacity(externals.len());
    for external in externals {
        let id = f.push_symbol(external, SymbolType::External, true, !external.starts_with('_'));
        f.names.insert(external, id);
        external_ids.push(id);
    }
    let terminal_count = f.symbols.len();

    for (rule_name, rule) in rules {
        if rule.as_token().is_none() && !f.names.contains_key(rule_name.as_str()) {
            let id = f.push_symbol(rule_name, SymbolType::NonTerminal, true, !rule_name.starts_with('_'));
            f.names.insert(rule_name, id);
        }
    }

    let start = f.names[start_name.as_str()];
    f.add_production(start, vec![start], &Alt::default());
    for (rule_name, rule) in rules {
        if rule.as_token().is_some() {
            continue;
        }
        f.current_rule = rule_name.as_str();
        f.repeat_count = 0;
        let lhs = f.names[rule_name.as_str()];
        for alt in f.expand(rule)? {
            f.add_production(lhs, alt.symbols.clone(), &alt);
        }
    }

    if f.symbols.len() >= usize::from(FIRST_RESERVED) {
        return Err(GenerateError::TooLarge(format!("{} symbols", f.symbols.len())));
    }

    let productions = f
        .productions
        .into_iter()
        .zip(f.metadata)
        .map(|((lhs, rhs), (precedence, dynamic_precedence))| FlatProduction {
            lhs,
            rhs,
            precedence,
            dynamic_precedence,
        })
        .collect();

    Ok(FlatGrammar {
        symbols: f.symbols,
        tokens: f.tokens,
        extras: extra_ids,
        externals: external_ids,
        terminal_count,
        productions,
    })
}

fn to_pattern(token: &Rule) -> Result<TokenPattern, GenerateError> {
    match token {
        Rule::String(text) => Ok(TokenPattern::Literal(text.clone())),
        Rule::Pattern(source) => {
            Regex::new(source).map_err(|source_err| GenerateError::InvalidPattern {
                pattern: source.clone(),
                source: source_err,
            })?;
            Ok(TokenPattern::Regex(source.clone()))
        }
        _ => unreachable!("to_pattern called on a non-token rule"),
    }
}

impl<'g> Flattener<'g> {
    fn push_symbol(&mut self, name: &str, kind: SymbolType, named: bool, visible: bool) -> SymbolId {
        let id = self.symbols.len() as SymbolId;
        self.symbols.push(SymbolInfo {
            name: name.to_string(),
            kind,
            named,
            visible,
        });
        id
    }

    /// Allocate anonymous tokens for literals and inline patterns.
    fn collect_leaves(&mut self, rule: &'g Rule) -> Result<(), GenerateError> {
        match rule {
            Rule::String(text) => {
                if !self.literals.contains_key(text.as_str()) {
                    let id = self.push_symbol(text, SymbolType::Terminal, false, true);
                    self.tokens.push(TokenRule {
                        symbol: id,
                        pattern: TokenPattern::Literal(text.clone()),
                    });
                    self.literals.insert(text, id);
                }
            }
            Rule::Pattern(source) => {
                if !self.patterns.contains_key(source.as_str()) {
                    let name = format!("_pattern{}", self.patterns.len() + 1);
                    let id = self.push_symbol(&name, SymbolType::Terminal, false, false);
                    self.tokens.push(TokenRule {
                        symbol: id,
                        pattern: to_pattern(rule)?,
                    });
                    self.patterns.insert(source, id);
                }
            }
            Rule::Seq(items) | Rule::Choice(items) => {
                for item in items {
                    self.collect_leaves(item)?;
                }
            }
            Rule::Repeat(inner)
            | Rule::Repeat1(inner)
            | Rule::Prec { rule: inner, .. }
            | Rule::PrecDynamic { rule: inner, .. } => self.collect_leaves(inner)?,
            Rule::Blank | Rule::Symbol(_) => {}
        }
        Ok(())
    }

    fn add_production(&mut self, lhs: SymbolId, rhs: Vec<SymbolId>, alt: &Alt) {
        if self.productions.insert((lhs, rhs)) {
            self.metadata.push((alt.precedence, alt.dynamic_precedence));
        }
    }

    fn expand(&mut self, rule: &Rule) -> Result<Vec<Alt>, GenerateError> {
        let single = |symbol| vec![Alt {
            symbols: vec![symbol],
            ..Alt::default()
        }];
        Ok(match rule {
            Rule::Blank => vec![Alt::default()],
            Rule::String(text) => single(self.literals[text.as_str()]),
            Rule::Pattern(source) => single(self.patterns[source.as_str()]),
            Rule::Symbol(name) => match self.names.get(name.as_str()) {
                Some(&id) => single(id),
                None => {
                    return Err(GenerateError::UndefinedSymbol {
                        rule: self.current_rule.to_string(),
                        name: name.clone(),
                    });
                }
            },
            Rule::Seq(items) => {
                let mut result = vec![Alt::default()];
                for item in items {
                    let tails = self.expand(item)?;
                    result = result
                        .iter()
                        .flat_map(|head| tails.iter().map(move |tail| head.then(tail)))
                        .collect();
                }
                result
            }
            Rule::Choice(items) => {
                let mut result = Vec::new();
                for item in items {
                    result.extend(self.expand(item)?);
                }
                result
            }
            Rule::Repeat(inner) => {
                let (aux, _) = self.repeat_symbol(inner)?;
                let mut result = vec![Alt::default()];
                result.extend(aux.map(single).unwrap_or_default());
                result
            }
            Rule::Repeat1(inner) => {
                let (aux, nullable) = self.repeat_symbol(inner)?;
                let mut result = if nullable { vec![Alt::default()] } else { Vec::new() };
                result.extend(aux.map(single).unwrap_or_default());
                result
            }
            Rule::Prec { value, assoc, rule } => {
                let mut alts = self.expand(rule)?;
                for alt in &mut alts {
                    alt.precedence = Some((*value, *assoc));
                }
                alts
            }
            Rule::PrecDynamic { value, rule } => {
                let mut alts = self.expand(rule)?;
                for alt in &mut alts {
                    alt.dynamic_precedence = *value;
                }
                alts
            }
        })
    }

    /// Hidden left-recursive helper `A -> A x | x` for `x+`. Returns the
    /// helper (absent when `x` only matches nothing) and whether `x` is
    /// nullable.
    fn repeat_symbol(&mut self, inner: &Rule) -> Result<(Option<SymbolId>, bool), GenerateError> {
        let alts = self.expand(inner)?;
        let nullable = alts.iter().any(|alt| alt.symbols.is_empty());
        if alts.iter().all(|alt| alt.symbols.is_empty()) {
            return Ok((None, nullable));
        }

        self.repeat_count += 1;
        let name = format!("{}_repeat{}", self.current_rule, self.repeat_count);
        let aux = self.push_symbol(&name, SymbolType::NonTerminal, false, false);
        for alt in alts.iter().filter(|alt| !alt.symbols.is_empty()) {
            self.add_production(aux, alt.symbols.clone(), alt);
            let mut recursive = vec![aux];
            recursive.extend_from_slice(&alt.symbols);
            self.add_production(aux, recursive, alt);
        }
        Ok((Some(aux), nullable))
    }
}
