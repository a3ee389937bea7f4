//! External scanner hooks.
//!
//! Context-sensitive tokens (indentation, heredocs, string interpolation)
//! cannot be described by the table-driven lexer. A grammar lists such
//! tokens as *externals* and names a scanner; at parse time the lexer hands
//! the scanner a cursor over the remaining input plus the set of externals
//! the current parse state accepts. The scanner either recognizes one of
//! them or declines, in which case the internal lexer runs.
//!
//! Scanners are shared across GLR stack versions, so their state must be
//! fully captured by `serialize` and restored by `deserialize`.

use std::sync::Arc;

use thiserror::Error;

use super::cursor::ScanCursor;

/// A grammar-specific lexing capability.
pub trait ExternalScanner: Send {
    /// Try to recognize one of the valid external tokens at the cursor.
    ///
    /// `valid[i]` tells whether the grammar's `i`-th external token is
    /// acceptable in the current parse state. Returns the index of the
    /// recognized token, or `None` to decline.
    fn scan(
        &mut self,
        cursor: &mut ScanCursor<'_>,
        valid: &[bool],
    ) -> Result<Option<usize>, ScannerError>;

    /// Snapshot the scanner's state.
    fn serialize(&self) -> Vec<u8>;

    /// Restore a snapshot produced by `serialize`.
    fn deserialize(&mut self, state: &[u8]) -> Result<(), ScannerError>;
}

/// Creates fresh scanner instances, one per parser.
pub type ScannerFactory = Arc<dyn Fn() -> Box<dyn ExternalScanner> + Send + Sync>;

/// Fatal scanner faults. These abort the parse, unlike syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScannerError {
    /// The scanner reported a failure of its own.
    #[error("external scanner failed: {0}")]
    Failed(String),

    /// The scanner returned a token that is unknown or not valid here.
    #[error("external scanner returned token {index}, which is not valid in this state")]
    InvalidToken { index: usize },

    /// A state snapshot could not be restored.
    #[error("external scanner state is corrupt: {0}")]
    CorruptState(String),
}
