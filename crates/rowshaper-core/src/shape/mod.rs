//! Shape descriptors: the declarative map from flat row columns onto a
//! nested element graph.
//!
//! Shapes are immutable inputs produced upstream. The plan compiler walks
//! them once; nothing here performs any reading.

mod identity;

use crate::value::{ScalarType, Value};
use std::{fmt, sync::Arc};

// re-exports
pub use identity::{EntitySetSource, IdentityShape};

///
/// ShapeNode
///

#[derive(Clone, Debug)]
pub enum ShapeNode {
    Scalar(ScalarShape),
    Structure(StructureShape),
    Collection(CollectionShape),
    Polymorphic(PolymorphicShape),
    Reference(ReferenceShape),
    MultiDiscriminator(MultiDiscriminatorShape),

    /// Variable reference; upstream must resolve these before compilation.
    VarRef(String),
}

impl ShapeNode {
    /// Short kind label for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Structure(_) => "structure",
            Self::Collection(_) => "collection",
            Self::Polymorphic(_) => "polymorphic",
            Self::Reference(_) => "reference",
            Self::MultiDiscriminator(_) => "multi_discriminator",
            Self::VarRef(_) => "var_ref",
        }
    }
}

impl From<ScalarShape> for ShapeNode {
    fn from(shape: ScalarShape) -> Self {
        Self::Scalar(shape)
    }
}

impl From<StructureShape> for ShapeNode {
    fn from(shape: StructureShape) -> Self {
        Self::Structure(shape)
    }
}

impl From<CollectionShape> for ShapeNode {
    fn from(shape: CollectionShape) -> Self {
        Self::Collection(shape)
    }
}

impl From<PolymorphicShape> for ShapeNode {
    fn from(shape: PolymorphicShape) -> Self {
        Self::Polymorphic(shape)
    }
}

impl From<ReferenceShape> for ShapeNode {
    fn from(shape: ReferenceShape) -> Self {
        Self::Reference(shape)
    }
}

impl From<MultiDiscriminatorShape> for ShapeNode {
    fn from(shape: MultiDiscriminatorShape) -> Self {
        Self::MultiDiscriminator(shape)
    }
}

///
/// ScalarShape
///
/// Typed read of one column. `name` labels the column in conversion and
/// null diagnostics when no property owns it.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScalarShape {
    pub ordinal: usize,
    pub scalar_type: ScalarType,
    pub nullable: bool,
    pub name: Option<String>,
}

impl ScalarShape {
    #[must_use]
    pub const fn new(ordinal: usize, scalar_type: ScalarType) -> Self {
        Self {
            ordinal,
            scalar_type,
            nullable: false,
            name: None,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether a null column is a legal read for this shape.
    #[must_use]
    pub const fn accepts_null(&self) -> bool {
        self.nullable || self.scalar_type.is_reference_repr()
    }
}

///
/// PropertyShape
///

#[derive(Clone, Debug)]
pub struct PropertyShape {
    pub name: String,
    pub node: ShapeNode,
}

///
/// StructureShape
///
/// A typed object built from per-property shapes. A structure with an
/// identity is an entity.
///

#[derive(Clone, Debug)]
pub struct StructureShape {
    pub type_name: String,
    pub properties: Vec<PropertyShape>,
    pub null_sentinel: Option<usize>,
    pub identity: Option<IdentityShape>,
}

impl StructureShape {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Vec::new(),
            null_sentinel: None,
            identity: None,
        }
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, node: impl Into<ShapeNode>) -> Self {
        self.properties.push(PropertyShape {
            name: name.into(),
            node: node.into(),
        });
        self
    }

    /// The whole structure is null whenever this column is null.
    #[must_use]
    pub const fn null_sentinel(mut self, ordinal: usize) -> Self {
        self.null_sentinel = Some(ordinal);
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: IdentityShape) -> Self {
        self.identity = Some(identity);
        self
    }
}

///
/// CollectionShape
///
/// A nested (or root) collection. `keys` identify one element across the
/// rows that carry it; an optional discriminator gates which rows belong
/// to this collection at all.
///

#[derive(Clone, Debug)]
pub struct CollectionShape {
    pub element: Box<ShapeNode>,
    pub keys: Vec<ScalarShape>,
    pub discriminator: Option<(ScalarShape, Value)>,
}

impl CollectionShape {
    #[must_use]
    pub fn new(element: impl Into<ShapeNode>) -> Self {
        Self {
            element: Box::new(element.into()),
            keys: Vec::new(),
            discriminator: None,
        }
    }

    #[must_use]
    pub fn key(mut self, key: ScalarShape) -> Self {
        self.keys.push(key);
        self
    }

    #[must_use]
    pub fn discriminator(mut self, column: ScalarShape, value: impl Into<Value>) -> Self {
        self.discriminator = Some((column, value.into()));
        self
    }
}

///
/// PolymorphicShape
///
/// Tag-dispatched choice between structures. Tags are tried in order;
/// an unmatched tag materializes null.
///

#[derive(Clone, Debug)]
pub struct PolymorphicShape {
    pub discriminator: ScalarShape,
    pub choices: Vec<(Value, StructureShape)>,
}

impl PolymorphicShape {
    #[must_use]
    pub const fn new(discriminator: ScalarShape) -> Self {
        Self {
            discriminator,
            choices: Vec::new(),
        }
    }

    #[must_use]
    pub fn choice(mut self, tag: impl Into<Value>, shape: StructureShape) -> Self {
        self.choices.push((tag.into(), shape));
        self
    }
}

///
/// ReferenceShape
///
/// Materializes the identity key of a related entity, not the entity.
///

#[derive(Clone, Debug)]
pub struct ReferenceShape {
    pub identity: IdentityShape,
}

impl ReferenceShape {
    #[must_use]
    pub const fn new(identity: IdentityShape) -> Self {
        Self { identity }
    }
}

/// Opaque type chooser over several discriminator values.
pub type TypeChooser = Arc<dyn Fn(&[Value]) -> Option<String> + Send + Sync>;

///
/// MultiDiscriminatorShape
///
/// Polymorphic choice driven by an opaque function of several columns.
/// Its dispatch cannot be compared structurally, so compiled plans for it
/// are never shared.
///

#[derive(Clone)]
pub struct MultiDiscriminatorShape {
    pub discriminators: Vec<ScalarShape>,
    pub choices: Vec<(String, StructureShape)>,
    pub chooser: TypeChooser,
}

impl MultiDiscriminatorShape {
    #[must_use]
    pub fn new(
        discriminators: Vec<ScalarShape>,
        chooser: impl Fn(&[Value]) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            discriminators,
            choices: Vec::new(),
            chooser: Arc::new(chooser),
        }
    }

    #[must_use]
    pub fn choice(mut self, shape: StructureShape) -> Self {
        self.choices.push((shape.type_name.clone(), shape));
        self
    }
}

impl fmt::Debug for MultiDiscriminatorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiDiscriminatorShape")
            .field("discriminators", &self.discriminators)
            .field("choices", &self.choices)
            .finish_non_exhaustive()
    }
}
