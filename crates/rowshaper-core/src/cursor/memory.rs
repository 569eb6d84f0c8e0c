use crate::{
    cursor::{CursorError, RowCursor},
    value::Value,
};

///
/// VecRowCursor
///
/// In-memory cursor over already-fetched rows.
/// An optional read failure can be armed at a given row position.
///

#[derive(Clone, Debug, Default)]
pub struct VecRowCursor {
    field_count: usize,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
    closed: bool,
    fail_at: Option<(usize, String)>,
}

impl VecRowCursor {
    /// Build a cursor; every row must have `field_count` columns.
    #[must_use]
    pub const fn new(field_count: usize, rows: Vec<Vec<Value>>) -> Self {
        Self {
            field_count,
            rows,
            position: None,
            closed: false,
            fail_at: None,
        }
    }

    /// Build a cursor whose width is taken from the first row.
    #[must_use]
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Self {
        let field_count = rows.first().map_or(0, Vec::len);
        Self::new(field_count, rows)
    }

    /// Fail the advance onto row `row` (zero-based) with a read error.
    #[must_use]
    pub fn fail_at(mut self, row: usize, message: impl Into<String>) -> Self {
        self.fail_at = Some((row, message.into()));
        self
    }

    #[must_use]
    pub const fn rows_consumed(&self) -> usize {
        match self.position {
            Some(pos) => pos + 1,
            None => 0,
        }
    }

    fn current_row(&self) -> Result<&[Value], CursorError> {
        if self.closed {
            return Err(CursorError::Closed);
        }

        self.position
            .and_then(|pos| self.rows.get(pos))
            .map(Vec::as_slice)
            .ok_or(CursorError::NoCurrentRow)
    }
}

impl RowCursor for VecRowCursor {
    fn advance(&mut self) -> Result<bool, CursorError> {
        if self.closed {
            return Err(CursorError::Closed);
        }

        let next = self.position.map_or(0, |pos| pos + 1);
        if let Some((row, message)) = &self.fail_at
            && *row == next
        {
            return Err(CursorError::Read(message.clone()));
        }

        if next >= self.rows.len() {
            self.position = Some(self.rows.len());
            return Ok(false);
        }

        self.position = Some(next);
        Ok(true)
    }

    fn field_count(&self) -> usize {
        self.field_count
    }

    fn value(&self, ordinal: usize) -> Result<&Value, CursorError> {
        let row = self.current_row()?;

        row.get(ordinal).ok_or(CursorError::OrdinalOutOfRange {
            ordinal,
            field_count: self.field_count,
        })
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
