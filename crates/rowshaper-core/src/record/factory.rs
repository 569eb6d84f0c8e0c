use crate::{
    element::Element, error::InternalError, plan::AccessorPair, value::ScalarType,
};
use std::{collections::BTreeMap, fmt};

///
/// ColumnKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    Scalar(ScalarType),
    Structure,
    Collection,
    Reference,
}

impl ColumnKind {
    /// Columns whose values may hold records needing buffer promotion.
    #[must_use]
    pub const fn is_nested(self) -> bool {
        matches!(self, Self::Structure | Self::Collection)
    }
}

///
/// RecordColumn
///
/// Compile-time description of one record column.
///

pub(crate) struct RecordColumn {
    pub(crate) name: String,
    pub(crate) kind: ColumnKind,
    pub(crate) gather: AccessorPair<Element>,
}

///
/// RecordStateFactory
///
/// Compiled, shared description of one record type: names, kinds, nested
/// flags and the accessors that gather a row into a record.
///

pub struct RecordStateFactory {
    type_name: String,
    column_names: Vec<String>,
    column_kinds: Vec<ColumnKind>,
    nested: Vec<bool>,
    lookup: FieldNameLookup,
    gather: Vec<AccessorPair<Element>>,
}

impl RecordStateFactory {
    pub(crate) fn new(type_name: impl Into<String>, columns: Vec<RecordColumn>) -> Self {
        let mut column_names = Vec::with_capacity(columns.len());
        let mut column_kinds = Vec::with_capacity(columns.len());
        let mut nested = Vec::with_capacity(columns.len());
        let mut gather = Vec::with_capacity(columns.len());

        for column in columns {
            nested.push(column.kind.is_nested());
            column_kinds.push(column.kind);
            column_names.push(column.name);
            gather.push(column.gather);
        }

        let lookup = FieldNameLookup::new(&column_names);

        Self {
            type_name: type_name.into(),
            column_names,
            column_kinds,
            nested,
            lookup,
            gather,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub const fn field_count(&self) -> usize {
        self.column_names.len()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn column_kind(&self, ordinal: usize) -> Option<ColumnKind> {
        self.column_kinds.get(ordinal).copied()
    }

    pub(crate) fn is_nested(&self, ordinal: usize) -> bool {
        self.nested.get(ordinal).copied().unwrap_or(false)
    }

    pub(crate) fn gather(&self) -> &[AccessorPair<Element>] {
        &self.gather
    }

    pub(crate) fn name_at(&self, ordinal: usize) -> Result<&str, InternalError> {
        self.column_names
            .get(ordinal)
            .map(String::as_str)
            .ok_or_else(|| ordinal_out_of_range(ordinal, self.field_count()))
    }

    pub(crate) fn ordinal_of(&self, name: &str) -> Result<usize, InternalError> {
        self.lookup.ordinal(name)
    }
}

impl fmt::Debug for RecordStateFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStateFactory")
            .field("type_name", &self.type_name)
            .field("column_names", &self.column_names)
            .field("column_kinds", &self.column_kinds)
            .finish_non_exhaustive()
    }
}

pub(crate) fn ordinal_out_of_range(ordinal: usize, field_count: usize) -> InternalError {
    InternalError::record_invariant(format!(
        "record ordinal {ordinal} is out of range for {field_count} columns"
    ))
}

///
/// FieldNameLookup
///
/// Exact match first, then ASCII case-insensitive match. A case-insensitive
/// name shared by several columns is ambiguous.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct FieldNameLookup {
    exact: BTreeMap<String, usize>,
    folded: BTreeMap<String, Option<usize>>,
}

impl FieldNameLookup {
    pub(crate) fn new(names: &[String]) -> Self {
        let mut exact = BTreeMap::new();
        let mut folded = BTreeMap::new();

        for (ordinal, name) in names.iter().enumerate() {
            exact.entry(name.clone()).or_insert(ordinal);
            folded
                .entry(name.to_ascii_lowercase())
                .and_modify(|slot| *slot = None)
                .or_insert(Some(ordinal));
        }

        Self { exact, folded }
    }

    pub(crate) fn ordinal(&self, name: &str) -> Result<usize, InternalError> {
        if let Some(ordinal) = self.exact.get(name) {
            return Ok(*ordinal);
        }

        match self.folded.get(&name.to_ascii_lowercase()) {
            Some(Some(ordinal)) => Ok(*ordinal),
            Some(None) => Err(InternalError::record_invariant(format!(
                "column name '{name}' is ambiguous"
            ))),
            None => Err(InternalError::record_invariant(format!(
                "no column named '{name}'"
            ))),
        }
    }
}
