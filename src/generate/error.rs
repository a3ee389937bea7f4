//! Generator errors.

use thiserror::Error;

/// Problems found while building tables from rules.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// No rules were defined.
    #[error("grammar `{0}` has no rules")]
    EmptyGrammar(String),

    /// A rule references a name that is neither a rule nor an external.
    #[error("rule `{rule}` references undefined symbol `{name}`")]
    UndefinedSymbol { rule: String, name: String },

    /// The first rule must be a non-terminal.
    #[error("start rule `{0}` is a token")]
    TerminalStart(String),

    /// Extras must be tokens.
    #[error("extra `{0}` is not a token")]
    InvalidExtra(String),

    /// A pattern does not compile.
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The grammar needs more symbols or states than the table format holds.
    #[error("grammar exceeds table limits: {0}")]
    TooLarge(String),
}
