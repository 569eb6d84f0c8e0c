//! Materialized output graph.

mod entity;
mod wire;


use crate::{record::RecordState, session::CoordinatorId, value::Value};

// re-exports
pub use entity::{EntityKey, MergeOption};

///
/// Element
///
/// One materialized node: a root result, a property value or a collection
/// item.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Null,
    Scalar(Value),
    Object(Object),
    Record(RecordState),
    Collection(Collection),
    Reference(EntityKey),
}

impl Element {
    /// Null elements and promoted null records.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Record(record) => record.is_null_record(),
            _ => false,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_record(&self) -> Option<&RecordState> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Fill the pending collection owned by `owner` with its closed items.
    ///
    /// Returns `true` once the placeholder was found; `items` is taken then.
    pub(crate) fn fill_pending(
        &mut self,
        owner: CoordinatorId,
        items: &mut Option<Vec<Self>>,
    ) -> bool {
        match self {
            Self::Collection(collection) => collection.fill_pending(owner, items),
            Self::Object(object) => object
                .properties
                .iter_mut()
                .any(|(_, value)| value.fill_pending(owner, items)),
            Self::Record(record) => record.fill_pending(owner, items),
            Self::Null | Self::Scalar(_) | Self::Reference(_) => false,
        }
    }

    /// Whether a freshly built, not yet promoted element stands for "no
    /// instance". Records answer from their pending null flag.
    pub(crate) const fn is_null_instance(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Record(record) => record.is_pending_null(),
            _ => false,
        }
    }

    /// Promote every reachable record's pending buffer to current.
    pub(crate) fn accept_pending_values(&mut self) {
        match self {
            Self::Record(record) => record.accept_pending_values(),
            Self::Object(object) => {
                for (_, value) in &mut object.properties {
                    value.accept_pending_values();
                }
            }
            Self::Collection(collection) => {
                if let CollectionState::Ready(items) = &mut collection.0 {
                    for item in items {
                        item.accept_pending_values();
                    }
                }
            }
            Self::Null | Self::Scalar(_) | Self::Reference(_) => {}
        }
    }
}

impl From<Value> for Element {
    fn from(value: Value) -> Self {
        if value.is_null() {
            Self::Null
        } else {
            Self::Scalar(value)
        }
    }
}

///
/// Object
///
/// A constructed instance of a mapped type.
/// Properties keep their declaration order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub type_name: String,
    pub properties: Vec<(String, Element)>,
    pub key: Option<EntityKey>,
}

impl Object {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Vec::new(),
            key: None,
        }
    }

    /// Set a property, replacing an existing value of the same name.
    pub fn set(&mut self, name: &str, value: Element) {
        if let Some((_, slot)) = self.properties.iter_mut().find(|(n, _)| n == name) {
            *slot = value;
        } else {
            self.properties.push((name.to_string(), value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Element> {
        self.properties
            .iter()
            .find_map(|(n, value)| (n == name).then_some(value))
    }
}

///
/// Collection
///
/// Items of a nested collection. A collection is pending while its owning
/// coordinator still accumulates rows, and is only ever handed to callers
/// after it was closed.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Collection(CollectionState);

#[derive(Clone, Debug, PartialEq)]
enum CollectionState {
    Pending(CoordinatorId),
    Ready(Vec<Element>),
}

impl Collection {
    #[must_use]
    pub const fn new(items: Vec<Element>) -> Self {
        Self(CollectionState::Ready(items))
    }

    pub(crate) const fn pending(owner: CoordinatorId) -> Self {
        Self(CollectionState::Pending(owner))
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.0, CollectionState::Pending(_))
    }

    #[must_use]
    pub fn items(&self) -> &[Element] {
        match &self.0 {
            CollectionState::Ready(items) => items,
            CollectionState::Pending(_) => &[],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.items().iter()
    }

    fn fill_pending(&mut self, owner: CoordinatorId, items: &mut Option<Vec<Element>>) -> bool {
        if let CollectionState::Pending(id) = self.0 {
            if id != owner {
                return false;
            }
            self.0 = CollectionState::Ready(items.take().unwrap_or_default());

            return true;
        }

        match &mut self.0 {
            CollectionState::Ready(existing) => existing
                .iter_mut()
                .any(|item| item.fill_pending(owner, items)),
            CollectionState::Pending(_) => false,
        }
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
