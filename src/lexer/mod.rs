//! Lexing for runtime grammars.
//!
//! The lexer is table-driven: token recognizers come from the compiled
//! unit, and the parser tells the lexer which tokens are valid at each
//! position. Tokens that need context the tables cannot express are
//! delegated to an [`ExternalScanner`].

mod cursor;
mod external;
mod indent;
#[allow(clippy::module_inception)]
mod lexer;
mod rules;

pub use cursor::ScanCursor;
pub use external::{ExternalScanner, ScannerError, ScannerFactory};
pub use indent::IndentScanner;
pub use lexer::{Lexeme, ScannerState, Trivia};

pub(crate) use lexer::Lexer;
pub(crate) use rules::LexicalRules;
