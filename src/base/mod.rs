//! Foundation types for the arbor engine.
//!
//! This module provides fundamental types used throughout the engine:
//! - [`Point`] - 0-based (row, column) source positions
//! - [`ColumnEncoding`] - how columns are counted
//! - [`LineIndex`] - byte offset to point conversion
//!
//! This module has NO dependencies on other arbor modules.

mod line_index;
mod position;

pub use line_index::LineIndex;
pub use position::{ColumnEncoding, Point};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
