//! Collaborator seams.
//!
//! Construction, identity resolution and type resolution are injected;
//! the materializer never owns tracking state itself.

use crate::{
    element::{Element, EntityKey, MergeOption, Object},
    error::InternalError,
};
use std::collections::BTreeMap;

///
/// ObjectFactory
///
/// Supplies empty instances of mapped types and sets their properties.
///

pub trait ObjectFactory: Send + Sync {
    fn create(&self, type_name: &str) -> Result<Object, InternalError>;

    fn set_property(
        &self,
        object: &mut Object,
        name: &str,
        value: Element,
    ) -> Result<(), InternalError>;
}

///
/// DefaultObjectFactory
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultObjectFactory;

impl ObjectFactory for DefaultObjectFactory {
    fn create(&self, type_name: &str) -> Result<Object, InternalError> {
        Ok(Object::new(type_name))
    }

    fn set_property(
        &self,
        object: &mut Object,
        name: &str,
        value: Element,
    ) -> Result<(), InternalError> {
        object.set(name, value);

        Ok(())
    }
}

///
/// IdentityResolver
///
/// Given an entity's key, a freshly built instance and the merge option,
/// returns the instance callers should see.
///

pub trait IdentityResolver: Send + Sync {
    fn resolve(
        &self,
        key: &EntityKey,
        object: Object,
        merge_option: MergeOption,
    ) -> Result<Object, InternalError>;
}

///
/// NoTracking
///
/// Returns every fresh instance unchanged.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoTracking;

impl IdentityResolver for NoTracking {
    fn resolve(
        &self,
        _key: &EntityKey,
        object: Object,
        _merge_option: MergeOption,
    ) -> Result<Object, InternalError> {
        Ok(object)
    }
}

///
/// MappingTarget
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MappingTarget {
    Object,
    Record,
}

///
/// TypeMapping
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TypeMapping {
    pub is_abstract: bool,
    pub target: MappingTarget,
}

impl TypeMapping {
    #[must_use]
    pub const fn object() -> Self {
        Self {
            is_abstract: false,
            target: MappingTarget::Object,
        }
    }

    #[must_use]
    pub const fn record() -> Self {
        Self {
            is_abstract: false,
            target: MappingTarget::Record,
        }
    }

    #[must_use]
    pub const fn abstract_object() -> Self {
        Self {
            is_abstract: true,
            target: MappingTarget::Object,
        }
    }
}

///
/// TypeCatalog
///
/// Resolves structure type names at compile time. `None` means the type
/// is unmapped, which is a configuration error.
///

pub trait TypeCatalog: Send + Sync {
    fn resolve(&self, type_name: &str) -> Option<TypeMapping>;
}

///
/// OpenCatalog
///
/// Maps every type to a concrete object.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct OpenCatalog;

impl TypeCatalog for OpenCatalog {
    fn resolve(&self, _type_name: &str) -> Option<TypeMapping> {
        Some(TypeMapping::object())
    }
}

///
/// StaticCatalog
///
/// Closed catalog over an explicit type table.
///

#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    types: BTreeMap<String, TypeMapping>,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            types: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>, mapping: TypeMapping) -> Self {
        self.types.insert(type_name.into(), mapping);
        self
    }
}

impl TypeCatalog for StaticCatalog {
    fn resolve(&self, type_name: &str) -> Option<TypeMapping> {
        self.types.get(type_name).copied()
    }
}
