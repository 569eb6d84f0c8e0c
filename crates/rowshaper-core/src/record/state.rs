use crate::{
    element::{Element, EntityKey},
    error::{ErrorClass, ErrorOrigin, InternalError},
    record::{
        ColumnKind, RecordStateFactory,
        factory::ordinal_out_of_range,
    },
    session::{CoordinatorId, RowContext},
    value::Value,
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::{fmt, mem, sync::Arc};

///
/// RecordState
///
/// Untyped structural record with double-buffered column values.
///
/// Rows gather into the pending buffer; `accept_pending_values` promotes
/// pending to current, recursively for nested records. Readers only ever
/// see the current buffer. The whole-record null flag is buffered the
/// same way and is independent of the column values.
///

#[derive(Clone)]
pub struct RecordState {
    factory: Arc<RecordStateFactory>,
    pending: Vec<Element>,
    current: Vec<Element>,
    pending_is_null: bool,
    current_is_null: bool,
    entity_key: Option<EntityKey>,
}

impl RecordState {
    pub(crate) fn new(factory: Arc<RecordStateFactory>) -> Self {
        let width = factory.field_count();

        Self {
            factory,
            pending: vec![Element::Null; width],
            current: vec![Element::Null; width],
            pending_is_null: false,
            current_is_null: false,
            entity_key: None,
        }
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Evaluate every column accessor against the current row into the
    /// pending buffer.
    pub(crate) fn gather_data(
        &mut self,
        ctx: &mut RowContext<'_>,
        diagnostic: bool,
    ) -> Result<(), InternalError> {
        let factory = Arc::clone(&self.factory);

        for (ordinal, accessor) in factory.gather().iter().enumerate() {
            let value = if diagnostic {
                (accessor.diagnostic)(ctx)?
            } else {
                (accessor.fast)(ctx)?
            };
            self.set_column_value(ordinal, value)?;
        }
        self.pending_is_null = false;

        Ok(())
    }

    pub(crate) fn set_column_value(
        &mut self,
        ordinal: usize,
        value: Element,
    ) -> Result<(), InternalError> {
        let width = self.pending.len();
        let slot = self
            .pending
            .get_mut(ordinal)
            .ok_or_else(|| ordinal_out_of_range(ordinal, width))?;
        *slot = value;

        Ok(())
    }

    pub(crate) fn set_null_record(&mut self) {
        for value in &mut self.pending {
            *value = Element::Null;
        }
        self.pending_is_null = true;
    }

    pub(crate) const fn is_pending_null(&self) -> bool {
        self.pending_is_null
    }

    pub(crate) fn set_entity_key(&mut self, key: Option<EntityKey>) {
        self.entity_key = key;
    }

    /// Swap the buffers, then promote nested records reachable through
    /// nested columns.
    pub(crate) fn accept_pending_values(&mut self) {
        mem::swap(&mut self.pending, &mut self.current);
        mem::swap(&mut self.pending_is_null, &mut self.current_is_null);

        for (ordinal, value) in self.current.iter_mut().enumerate() {
            if self.factory.is_nested(ordinal) {
                value.accept_pending_values();
            }
        }
    }

    pub(crate) fn fill_pending(
        &mut self,
        owner: CoordinatorId,
        items: &mut Option<Vec<Element>>,
    ) -> bool {
        self.pending
            .iter_mut()
            .chain(self.current.iter_mut())
            .any(|value| value.fill_pending(owner, items))
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.factory.type_name()
    }

    #[must_use]
    pub fn factory(&self) -> &RecordStateFactory {
        &self.factory
    }

    #[must_use]
    pub const fn field_count(&self) -> usize {
        self.current.len()
    }

    #[must_use]
    pub const fn is_null_record(&self) -> bool {
        self.current_is_null
    }

    #[must_use]
    pub const fn entity_key(&self) -> Option<&EntityKey> {
        self.entity_key.as_ref()
    }

    pub fn get_name(&self, ordinal: usize) -> Result<&str, InternalError> {
        self.factory.name_at(ordinal)
    }

    pub fn get_ordinal(&self, name: &str) -> Result<usize, InternalError> {
        self.factory.ordinal_of(name)
    }

    #[must_use]
    pub fn column_kind(&self, ordinal: usize) -> Option<ColumnKind> {
        self.factory.column_kind(ordinal)
    }

    pub fn get_value(&self, ordinal: usize) -> Result<&Element, InternalError> {
        self.current
            .get(ordinal)
            .ok_or_else(|| ordinal_out_of_range(ordinal, self.current.len()))
    }

    pub fn is_db_null(&self, ordinal: usize) -> Result<bool, InternalError> {
        Ok(self.get_value(ordinal)?.is_null())
    }

    /// Copy bytes of a blob column starting at `data_offset`.
    ///
    /// Without a buffer, returns the total length of the value. With one,
    /// copies as many bytes as fit and returns the count copied.
    pub fn get_bytes(
        &self,
        ordinal: usize,
        data_offset: usize,
        buffer: Option<&mut [u8]>,
    ) -> Result<usize, InternalError> {
        let bytes = match self.get_value(ordinal)? {
            Element::Scalar(Value::Blob(bytes)) => bytes.as_slice(),
            other => return Err(self.wrong_kind(ordinal, "Blob", other)),
        };

        Ok(copy_range(bytes, data_offset, buffer))
    }

    /// Copy characters of a text column starting at `data_offset`.
    ///
    /// Offsets count characters, not bytes.
    pub fn get_chars(
        &self,
        ordinal: usize,
        data_offset: usize,
        buffer: Option<&mut [char]>,
    ) -> Result<usize, InternalError> {
        let chars: Vec<char> = match self.get_value(ordinal)? {
            Element::Scalar(Value::Text(text)) => text.chars().collect(),
            other => return Err(self.wrong_kind(ordinal, "Text", other)),
        };

        Ok(copy_range(&chars, data_offset, buffer))
    }

    fn wrong_kind(&self, ordinal: usize, expected: &str, found: &Element) -> InternalError {
        let name = self.get_name(ordinal).unwrap_or("?");

        if found.is_null() {
            return InternalError::new(
                ErrorClass::NullViolation,
                ErrorOrigin::Record,
                format!("column '{name}' is null; a {expected} value is required"),
            );
        }

        InternalError::record_conversion(format!(
            "column '{name}' does not hold a {expected} value"
        ))
    }
}

fn copy_range<T: Copy>(source: &[T], offset: usize, buffer: Option<&mut [T]>) -> usize {
    let Some(buffer) = buffer else {
        return source.len();
    };

    let available = source.len().saturating_sub(offset);
    let count = available.min(buffer.len());
    if count > 0 {
        buffer[..count].copy_from_slice(&source[offset..offset + count]);
    }

    count
}

impl PartialEq for RecordState {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
            && self.current_is_null == other.current_is_null
            && self.current == other.current
            && self.entity_key == other.entity_key
    }
}

impl fmt::Debug for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordState")
            .field("type_name", &self.type_name())
            .field("current", &self.current)
            .field("is_null", &self.current_is_null)
            .field("entity_key", &self.entity_key)
            .finish_non_exhaustive()
    }
}

impl Serialize for RecordState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.current_is_null {
            return serializer.serialize_none();
        }

        let names = self.factory.column_names();
        let mut map = serializer.serialize_map(Some(names.len()))?;
        for (name, value) in names.iter().zip(&self.current) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
