//! Row cursor boundary.
//!
//! The materializer consumes rows through `RowCursor` only; it never
//! buffers more than the current row.

mod memory;

#[cfg(test)]
mod tests;

use crate::value::Value;
use thiserror::Error as ThisError;

// re-exports
pub use memory::VecRowCursor;

///
/// RowCursor
///
/// Forward-only, read-once reader over a flat row stream.
///

pub trait RowCursor {
    /// Move to the next row; `Ok(false)` once the stream is exhausted.
    fn advance(&mut self) -> Result<bool, CursorError>;

    /// Number of columns in every row.
    fn field_count(&self) -> usize;

    /// Read one column of the current row.
    fn value(&self, ordinal: usize) -> Result<&Value, CursorError>;

    fn is_null(&self, ordinal: usize) -> Result<bool, CursorError> {
        Ok(self.value(ordinal)?.is_null())
    }

    /// Release the underlying stream; further reads fail with `Closed`.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

///
/// CursorError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CursorError {
    #[error("row cursor is closed")]
    Closed,

    #[error("no current row")]
    NoCurrentRow,

    #[error("ordinal {ordinal} is out of range for {field_count} columns")]
    OrdinalOutOfRange { ordinal: usize, field_count: usize },

    #[error("{0}")]
    Read(String),
}

impl CursorError {
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
