/// Position tracking for tree nodes
///
/// Points are 0-based `(row, column)` pairs. Rows are counted in `\n`
/// terminated lines; columns follow the [`ColumnEncoding`] the tree was
/// parsed with.
use std::fmt;

/// A position in source text (0-indexed)
///
/// Ordering is lexicographic: first by row, then by column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// The point as a `(row, column)` tuple.
    pub fn as_tuple(self) -> (usize, usize) {
        (self.row, self.column)
    }
}

impl From<(usize, usize)> for Point {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}

impl PartialEq<(usize, usize)> for Point {
    fn eq(&self, other: &(usize, usize)) -> bool {
        self.row == other.0 && self.column == other.1
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// How the column of a [`Point`] is counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColumnEncoding {
    /// Bytes since the start of the line.
    #[default]
    Utf8,
    /// UTF-16 code units since the start of the line.
    Utf16,
}

impl ColumnEncoding {
    /// Width of `text` measured in this encoding's units.
    pub fn width(self, text: &str) -> usize {
        match self {
            Self::Utf8 => text.len(),
            Self::Utf16 => text.chars().map(char::len_utf16).sum(),
        }
    }
}
