use crate::{
    cursor::RowCursor,
    element::Element,
    error::InternalError,
    record::{ColumnKind, RecordState},
    session::Session,
};

///
/// RecordReader
///
/// Record-at-a-time reader over a session whose root elements are
/// records. `read` moves to the next record; the accessors then read the
/// current one by ordinal.
///

#[derive(Debug)]
pub struct RecordReader<C: RowCursor> {
    session: Session<C>,
    record: Option<RecordState>,
}

impl<C: RowCursor> RecordReader<C> {
    #[must_use]
    pub const fn new(session: Session<C>) -> Self {
        Self {
            session,
            record: None,
        }
    }

    /// Advance to the next record; `Ok(false)` at the end.
    pub fn read(&mut self) -> Result<bool, InternalError> {
        self.record = None;
        if !self.session.advance()? {
            return Ok(false);
        }

        match self.session.take_current() {
            Some(Element::Record(record)) => {
                self.record = Some(record);

                Ok(true)
            }
            Some(other) => Err(InternalError::record_conversion(format!(
                "root element is not a record: {other:?}"
            ))),
            None => Err(InternalError::record_invariant(
                "session advanced without a current element",
            )),
        }
    }

    /// The current record, if `read` returned `true`.
    #[must_use]
    pub const fn record(&self) -> Option<&RecordState> {
        self.record.as_ref()
    }

    fn current(&self) -> Result<&RecordState, InternalError> {
        self.record
            .as_ref()
            .ok_or_else(|| InternalError::record_invariant("no current record; call read first"))
    }

    pub fn field_count(&self) -> Result<usize, InternalError> {
        Ok(self.current()?.field_count())
    }

    pub fn get_name(&self, ordinal: usize) -> Result<&str, InternalError> {
        self.current()?.get_name(ordinal)
    }

    pub fn get_ordinal(&self, name: &str) -> Result<usize, InternalError> {
        self.current()?.get_ordinal(name)
    }

    pub fn column_kind(&self, ordinal: usize) -> Result<Option<ColumnKind>, InternalError> {
        Ok(self.current()?.column_kind(ordinal))
    }

    pub fn get_value(&self, ordinal: usize) -> Result<&Element, InternalError> {
        self.current()?.get_value(ordinal)
    }

    pub fn is_db_null(&self, ordinal: usize) -> Result<bool, InternalError> {
        self.current()?.is_db_null(ordinal)
    }

    pub fn get_bytes(
        &self,
        ordinal: usize,
        data_offset: usize,
        buffer: Option<&mut [u8]>,
    ) -> Result<usize, InternalError> {
        self.current()?.get_bytes(ordinal, data_offset, buffer)
    }

    pub fn get_chars(
        &self,
        ordinal: usize,
        data_offset: usize,
        buffer: Option<&mut [char]>,
    ) -> Result<usize, InternalError> {
        self.current()?.get_chars(ordinal, data_offset, buffer)
    }

    /// Stop reading and release the cursor.
    pub fn close(&mut self) {
        self.record = None;
        self.session.close();
    }

    #[must_use]
    pub fn into_session(self) -> Session<C> {
        self.session
    }
}
