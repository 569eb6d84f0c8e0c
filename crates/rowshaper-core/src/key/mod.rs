//! Structural shape keys.
//!
//! A shape key is a deterministic string over every shape property that
//! changes compiled accessors. Structurally identical shapes under the same
//! compile context produce identical keys; any difference changes the key.

mod fingerprint;


use crate::{
    compile::CompileContext,
    plan::MaterializeMode,
    shape::{
        CollectionShape, EntitySetSource, IdentityShape, PolymorphicShape, ScalarShape, ShapeNode,
        StructureShape,
    },
    traits::MappingTarget,
    value::{Value, wire_timestamp},
};
use derive_more::{Deref, Display};
use std::{
    fmt::Write as _,
    sync::atomic::{AtomicU64, Ordering},
};

// re-exports
pub use fingerprint::ShapeFingerprint;

// Multi-discriminator dispatch is opaque; each key build takes a fresh
// number so those shapes never share a cached plan.
static MULTI_DISCRIMINATOR_SEQ: AtomicU64 = AtomicU64::new(0);

///
/// ShapeKey
///

#[derive(Clone, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShapeKey(String);

impl ShapeKey {
    /// Build the cache key for `shape` compiled under `ctx`.
    #[must_use]
    pub fn build(shape: &ShapeNode, ctx: &CompileContext) -> Self {
        let mut builder = ShapeKeyBuilder {
            ctx,
            out: String::new(),
        };
        builder.context();
        builder.node(shape);

        Self(builder.out)
    }

    #[must_use]
    pub fn fingerprint(&self) -> ShapeFingerprint {
        ShapeFingerprint::of(self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

///
/// ShapeKeyBuilder
///
/// Visitor writing one short tag per node kind followed by its sub-keys.
/// Strings are length-prefixed so delimiters inside names cannot collide.
///

struct ShapeKeyBuilder<'c> {
    ctx: &'c CompileContext,
    out: String,
}

impl ShapeKeyBuilder<'_> {
    fn context(&mut self) {
        self.out.push_str("m:");
        self.out.push_str(self.ctx.mode.label());
        self.out.push_str(";o:");
        self.out.push_str(self.ctx.merge_option.label());
        self.out.push(';');
    }

    fn node(&mut self, node: &ShapeNode) {
        match node {
            ShapeNode::Scalar(scalar) => self.scalar(scalar),
            ShapeNode::Structure(structure) => self.structure(structure),
            ShapeNode::Collection(collection) => self.collection(collection),
            ShapeNode::Polymorphic(polymorphic) => self.polymorphic(polymorphic),
            ShapeNode::Reference(reference) => {
                self.out.push_str("F(");
                self.identity(&reference.identity);
                self.out.push(')');
            }
            ShapeNode::MultiDiscriminator(_) => {
                let seq = MULTI_DISCRIMINATOR_SEQ.fetch_add(1, Ordering::Relaxed);
                let _ = write!(self.out, "MD-{seq}");
            }
            ShapeNode::VarRef(name) => {
                self.out.push('V');
                self.string(name);
            }
        }
    }

    fn scalar(&mut self, scalar: &ScalarShape) {
        let _ = write!(
            self.out,
            "S({},{},{})",
            scalar.ordinal,
            scalar.scalar_type.to_u8(),
            if scalar.accepts_null() { 'n' } else { 'r' },
        );
    }

    fn structure(&mut self, structure: &StructureShape) {
        self.out.push_str("T(");
        self.string(&structure.type_name);
        self.mapping(&structure.type_name);

        match structure.null_sentinel {
            Some(ordinal) => {
                let _ = write!(self.out, ",ns{ordinal}");
            }
            None => self.out.push_str(",ns-"),
        }

        if let Some(identity) = &structure.identity {
            self.out.push(',');
            self.identity(identity);
        }

        self.out.push_str(",[");
        for property in &structure.properties {
            self.string(&property.name);
            self.out.push('=');
            self.node(&property.node);
            self.out.push(';');
        }
        self.out.push_str("])");
    }

    /// How the catalog resolves `type_name`: object, record, abstract or
    /// unmapped. Catalogs that resolve a shape alike share its plan.
    fn mapping(&mut self, type_name: &str) {
        let code = if self.ctx.mode == MaterializeMode::Records {
            'r'
        } else {
            match self.ctx.catalog.resolve(type_name) {
                None => 'u',
                Some(mapping) if mapping.is_abstract => 'a',
                Some(mapping) => match mapping.target {
                    MappingTarget::Object => 'o',
                    MappingTarget::Record => 'r',
                },
            }
        };

        self.out.push_str(",m");
        self.out.push(code);
    }

    fn identity(&mut self, identity: &IdentityShape) {
        self.out.push_str("I(");
        match &identity.entity_set {
            EntitySetSource::Fixed(set) => {
                self.out.push('f');
                self.string(set);
            }
            EntitySetSource::Discriminated { column, sets } => {
                self.out.push('d');
                self.scalar(column);
                self.out.push('[');
                for set in sets {
                    self.string(set);
                    self.out.push(';');
                }
                self.out.push(']');
            }
            EntitySetSource::Detached => self.out.push('x'),
        }

        self.out.push_str(",[");
        for key in &identity.keys {
            self.scalar(key);
        }
        self.out.push_str("])");
    }

    fn collection(&mut self, collection: &CollectionShape) {
        self.out.push_str("C(");
        self.node(&collection.element);

        self.out.push_str(",k[");
        for key in &collection.keys {
            self.scalar(key);
        }
        self.out.push(']');

        match &collection.discriminator {
            Some((column, value)) => {
                self.out.push_str(",d");
                self.scalar(column);
                self.out.push('=');
                self.value(value);
            }
            None => self.out.push_str(",d-"),
        }
        self.out.push(')');
    }

    fn polymorphic(&mut self, polymorphic: &PolymorphicShape) {
        self.out.push_str("P(");
        self.scalar(&polymorphic.discriminator);
        self.out.push_str(",[");
        for (tag, choice) in &polymorphic.choices {
            self.value(tag);
            self.out.push_str("=>");
            self.structure(choice);
            self.out.push(';');
        }
        self.out.push_str("])");
    }

    fn value(&mut self, value: &Value) {
        let _ = match value {
            Value::Null => write!(self.out, "n"),
            Value::Blob(bytes) => {
                let _ = write!(self.out, "b{}:", bytes.len());
                for byte in bytes {
                    let _ = write!(self.out, "{byte:02x}");
                }
                Ok(())
            }
            Value::Bool(v) => write!(self.out, "o{}", u8::from(*v)),
            Value::Decimal(v) => write!(self.out, "d{}e{}", v.mantissa(), v.scale()),
            Value::Float32(v) => write!(self.out, "f{:08x}", v.to_bits()),
            Value::Float64(v) => write!(self.out, "g{:016x}", v.to_bits()),
            Value::Int16(v) => write!(self.out, "h{v}"),
            Value::Int32(v) => write!(self.out, "i{v}"),
            Value::Int64(v) => write!(self.out, "l{v}"),
            Value::Text(v) => {
                self.out.push('t');
                self.string(v);
                Ok(())
            }
            Value::Timestamp(v) => write!(self.out, "s{}", wire_timestamp(v)),
            Value::Uint8(v) => write!(self.out, "u{v}"),
            Value::Ulid(v) => write!(self.out, "z{v}"),
        };
    }

    fn string(&mut self, value: &str) {
        let _ = write!(self.out, "{}:{value}", value.len());
    }
}
