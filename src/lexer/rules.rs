//! Compiled lexical rules of a grammar.

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::grammar::{GrammarError, LanguageTables, SymbolId, SymbolType, TokenPattern};

/// Recognizer for one token.
#[derive(Debug, Clone)]
pub(crate) enum TokenMatcher {
    Literal(Box<str>),
    Regex(Regex),
}

impl TokenMatcher {
    fn compile(pattern: &TokenPattern, token: &str) -> Result<Self, GrammarError> {
        match pattern {
            TokenPattern::Literal(text) => Ok(Self::Literal(text.as_str().into())),
            TokenPattern::Regex(source) => Regex::new(&format!(r"\A(?:{source})"))
                .map(Self::Regex)
                .map_err(|source| GrammarError::InvalidPattern {
                    token: token.to_string(),
                    source,
                }),
        }
    }

    /// Length of the match at the start of `rest`. Empty matches don't count.
    pub(crate) fn match_len(&self, rest: &str) -> Option<usize> {
        let len = match self {
            Self::Literal(text) => rest.starts_with(&**text).then_some(text.len())?,
            Self::Regex(regex) => regex.find(rest)?.end(),
        };
        (len > 0).then_some(len)
    }

    pub(crate) fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

/// Tokens valid in a group of parse states.
#[derive(Debug, Clone)]
pub(crate) struct LexMode {
    pub(crate) tokens: Box<[SymbolId]>,
    pub(crate) externals: Box<[bool]>,
    pub(crate) any_external: bool,
}

/// All lexical information of a grammar.
#[derive(Debug, Clone)]
pub(crate) struct LexicalRules {
    matchers: FxHashMap<SymbolId, TokenMatcher>,
    extras: Box<[SymbolId]>,
    modes: Vec<LexMode>,
    /// Every internal token, used when nothing valid matches.
    error_tokens: Box<[SymbolId]>,
}

impl LexicalRules {
    pub(crate) fn new(tables: &LanguageTables) -> Result<Self, GrammarError> {
        let language = tables.name.as_str();
        let symbol_info = |symbol: SymbolId| tables.symbols.get(usize::from(symbol));

        let mut matchers = FxHashMap::default();
        for rule in &tables.tokens {
            let info = symbol_info(rule.symbol).ok_or_else(|| {
                GrammarError::malformed(language, format!("token rule for unknown symbol {}", rule.symbol))
            })?;
            if info.kind != SymbolType::Terminal {
                return Err(GrammarError::malformed(
                    language,
                    format!("token rule for non-terminal `{}`", info.name),
                ));
            }
            matchers.insert(rule.symbol, TokenMatcher::compile(&rule.pattern, &info.name)?);
        }

        for &extra in &tables.extras {
            if !matchers.contains_key(&extra) {
                return Err(GrammarError::malformed(
                    language,
                    format!("extra symbol {extra} has no token rule"),
                ));
            }
        }

        let mut modes = Vec::with_capacity(tables.lex_modes.len());
        for (index, mode) in tables.lex_modes.iter().enumerate() {
            if let Some(&symbol) = mode.tokens.iter().find(|s| !matchers.contains_key(s)) {
                return Err(GrammarError::malformed(
                    language,
                    format!("lex mode {index} references symbol {symbol} without a token rule"),
                ));
            }
            if mode.externals.len() != tables.externals.len() {
                return Err(GrammarError::malformed(
                    language,
                    format!(
                        "lex mode {index} has {} external flags for {} externals",
                        mode.externals.len(),
                        tables.externals.len()
                    ),
                ));
            }
            modes.push(LexMode {
                tokens: mode.tokens.clone().into_boxed_slice(),
                externals: mode.externals.clone().into_boxed_slice(),
                any_external: mode.externals.iter().any(|&valid| valid),
            });
        }

        let mut error_tokens: Vec<SymbolId> = matchers
            .keys()
            .copied()
            .filter(|symbol| !tables.extras.contains(symbol))
            .collect();
        error_tokens.sort_unstable();

        Ok(Self {
            matchers,
            extras: tables.extras.clone().into_boxed_slice(),
            modes,
            error_tokens: error_tokens.into_boxed_slice(),
        })
    }

    pub(crate) fn mode(&self, index: u16) -> Option<&LexMode> {
        self.modes.get(usize::from(index))
    }

    pub(crate) fn mode_count(&self) -> usize {
        self.modes.len()
    }

    pub(crate) fn matcher(&self, symbol: SymbolId) -> Option<&TokenMatcher> {
        self.matchers.get(&symbol)
    }

    pub(crate) fn extras(&self) -> &[SymbolId] {
        &self.extras
    }

    pub(crate) fn is_extra(&self, symbol: SymbolId) -> bool {
        self.extras.contains(&symbol)
    }

    pub(crate) fn error_tokens(&self) -> &[SymbolId] {
        &self.error_tokens
    }
}
