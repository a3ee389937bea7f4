//! Parse failures.
//!
//! Syntax errors are not failures: they show up in the tree as `ERROR` and
//! `MISSING` nodes. These are the conditions under which no tree is built.

use smol_str::SmolStr;
use thiserror::Error;

use super::edit::InvalidEdit;
use crate::lexer::ScannerError;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no language set on the parser")]
    NoLanguage,

    #[error("external scanner failed: {0}")]
    Scanner(#[from] ScannerError),

    #[error("invalid edit: {0}")]
    InvalidEdit(#[from] InvalidEdit),

    #[error("previous tree was parsed with '{previous}', parser is set to '{current}'")]
    LanguageMismatch { previous: SmolStr, current: SmolStr },

    #[error("input of {0} bytes exceeds the 4 GiB limit")]
    InputTooLarge(usize),
}
