//! Input buffers.
//!
//! A buffer is a random-access character source with line and column
//! mapping. Conceptually it is an infinite sequence: every index at or past
//! the real length yields [`crate::chars::EOI`]. Two implementations are
//! provided, the plain [`DefaultInputBuffer`] and the preprocessing
//! [`IndentDedentInputBuffer`].

use serde::Serialize;

mod default;
mod indent;

pub use default::DefaultInputBuffer;
pub use indent::IndentDedentInputBuffer;

/// A 1-based line and column position inside an input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Random-access character source used by the matching core.
///
/// Lines are bounded by `\n`, `\r\n` or `\r`. Indices past the end are
/// legal everywhere and behave as if the buffer ended there.
pub trait InputBuffer: std::fmt::Debug {
    /// Returns the character at the given index, or `EOI` at or past the end.
    fn char_at(&self, index: usize) -> char;

    /// The number of real characters in the buffer.
    fn length(&self) -> usize;

    /// Extracts the text of the index range `[start, end)`, clamped to the
    /// real length.
    fn extract(&self, start: usize, end: usize) -> String;

    /// Extracts the text of the given 1-based line, without its terminator.
    fn extract_line(&self, line: usize) -> String;

    /// Maps an index to its 1-based line and column.
    fn position_of(&self, index: usize) -> Position;

    /// The number of lines in the buffer.
    fn line_count(&self) -> usize;
}
