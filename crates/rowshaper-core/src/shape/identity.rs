use crate::shape::ScalarShape;

///
/// IdentityShape
///
/// Key columns plus the source of the entity set name.
/// The first key column doubles as the entity's null test.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdentityShape {
    pub keys: Vec<ScalarShape>,
    pub entity_set: EntitySetSource,
}

impl IdentityShape {
    #[must_use]
    pub fn new(entity_set: impl Into<String>, keys: Vec<ScalarShape>) -> Self {
        Self {
            keys,
            entity_set: EntitySetSource::Fixed(entity_set.into()),
        }
    }

    /// Entity set chosen per row by the position held in `column`.
    #[must_use]
    pub const fn discriminated(column: ScalarShape, sets: Vec<String>, keys: Vec<ScalarShape>) -> Self {
        Self {
            keys,
            entity_set: EntitySetSource::Discriminated { column, sets },
        }
    }

    /// Free-floating entity without a set; it never gets an identity key.
    #[must_use]
    pub const fn detached(keys: Vec<ScalarShape>) -> Self {
        Self {
            keys,
            entity_set: EntitySetSource::Detached,
        }
    }
}

///
/// EntitySetSource
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EntitySetSource {
    Fixed(String),
    Discriminated {
        column: ScalarShape,
        sets: Vec<String>,
    },
    Detached,
}
