//! Error types for grammar loading.

use thiserror::Error;

/// Errors raised while loading a compiled grammar.
///
/// `NotFound` means the unit is fine but lacks the requested language;
/// every other variant means the unit itself could not be used.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// The requested language is not part of the compiled unit.
    #[error("language `{language}` not found in compiled unit (available: {})", available.join(", "))]
    NotFound {
        language: String,
        available: Vec<String>,
    },

    /// The unit was compiled for another table layout.
    #[error("incompatible ABI version {found} (engine supports {expected})")]
    AbiMismatch { found: u32, expected: u32 },

    /// Tables reference out-of-range symbols, states or productions.
    #[error("malformed grammar `{language}`: {message}")]
    Malformed { language: String, message: String },

    /// A token pattern does not compile.
    #[error("invalid pattern for token `{token}`: {source}")]
    InvalidPattern {
        token: String,
        #[source]
        source: regex::Error,
    },

    /// The grammar names an external scanner nobody registered.
    #[error("unknown external scanner `{0}`")]
    UnknownScanner(String),

    /// IO error while reading a unit.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The unit is not valid JSON or does not match the table layout.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GrammarError {
    pub(crate) fn malformed(language: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            language: language.to_string(),
            message: message.into(),
        }
    }

    /// The requested language is absent from an otherwise valid unit.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The unit itself is unreadable, malformed or incompatible.
    pub fn is_load_error(&self) -> bool {
        !self.is_not_found()
    }
}
