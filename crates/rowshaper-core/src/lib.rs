//! Core runtime for rowshaper: shape descriptors, the plan compiler and
//! cache, sessions over row cursors, and the materialized element graph.
//!
//! Rows arrive flat and sorted by nesting keys; shapes describe how
//! consecutive rows fold into nested objects, records and collections.

// public exports are one module level down
pub mod compile;
pub mod config;
pub mod cursor;
pub mod element;
pub mod error;
pub mod key;
pub mod materializer;
pub mod obs;
pub mod plan;
pub mod record;
pub mod session;
pub mod shape;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Domain vocabulary for describing shapes and consuming elements.
///

pub mod prelude {
    pub use crate::{
        cursor::{RowCursor, VecRowCursor},
        element::{Collection, Element, EntityKey, MergeOption, Object},
        materializer::Materializer,
        plan::MaterializeMode,
        record::RecordState,
        shape::{
            CollectionShape, IdentityShape, PolymorphicShape, ScalarShape, ShapeNode,
            StructureShape,
        },
        value::{ScalarType, Value},
    };
}
