//! Plan compiler.
//!
//! Walks a shape once and emits an immutable `Plan`: one compiled node per
//! collection, row accessors stored as closures, and state-slot numbers
//! assigned to every coordinator, key column and discriminated entity set.
//!
//! Every unsupported shape combination fails here, never while rows are
//! being materialized.

mod context;
mod identity;
mod polymorphic;
mod scalar;
mod scratchpad;
mod structure;

#[cfg(test)]
mod tests;

use crate::{
    element::{Collection, Element},
    error::{ColumnTarget, InternalError},
    key::ShapeKey,
    plan::{Accessor, AccessorPair, CollectionId, Plan, SlotId, accessor},
    shape::{CollectionShape, ShapeNode},
};
use scratchpad::CoordinatorScratchpad;

// re-exports
pub use context::CompileContext;
pub use polymorphic::DiscriminatorTable;

///
/// PlanCompiler
///
/// Recursive-descent compiler over one shape. Collection scopes nest like
/// the shape does; the innermost open scope is the current one.
///

pub(crate) struct PlanCompiler<'c> {
    ctx: &'c CompileContext,
    slot_count: usize,
    scratchpads: Vec<CoordinatorScratchpad>,
    current: Option<CollectionId>,
}

impl<'c> PlanCompiler<'c> {
    const fn new(ctx: &'c CompileContext) -> Self {
        Self {
            ctx,
            slot_count: 0,
            scratchpads: Vec::new(),
            current: None,
        }
    }

    /// Compile `shape` under `ctx`; the root must be a collection.
    pub(crate) fn compile(
        shape: &ShapeNode,
        ctx: &'c CompileContext,
        key: ShapeKey,
    ) -> Result<Plan, InternalError> {
        let ShapeNode::Collection(root) = shape else {
            return Err(InternalError::configuration(format!(
                "root shape must be a collection, found {}",
                shape.kind()
            )));
        };

        let mut compiler = Self::new(ctx);
        compiler.collection(root)?;

        let nodes = compiler
            .scratchpads
            .into_iter()
            .map(CoordinatorScratchpad::into_plan_node)
            .collect::<Result<Vec<_>, _>>()?;
        let fingerprint = key.fingerprint();

        Ok(Plan {
            nodes,
            state_slot_count: compiler.slot_count,
            key,
            fingerprint,
            mode: ctx.mode,
            merge_option: ctx.merge_option,
        })
    }

    fn allocate_slot(&mut self) -> SlotId {
        let slot = SlotId::from(self.slot_count);
        self.slot_count += 1;

        slot
    }

    /// Compile any node in element or property position.
    fn node(
        &mut self,
        node: &ShapeNode,
        target: ColumnTarget,
    ) -> Result<AccessorPair<Element>, InternalError> {
        match node {
            ShapeNode::Scalar(scalar) => Ok(scalar::compile_scalar(scalar, target)),
            ShapeNode::Structure(structure) => self.structure(structure),
            ShapeNode::Collection(collection) => self.collection(collection),
            ShapeNode::Polymorphic(polymorphic) => self.polymorphic(polymorphic),
            ShapeNode::Reference(reference) => self.reference(&reference.identity, &target),
            ShapeNode::MultiDiscriminator(multi) => self.multi_discriminator(multi),
            ShapeNode::VarRef(name) => Err(InternalError::shape_invariant(format!(
                "unresolved variable reference '{name}' reached the plan compiler"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    fn enter_scope(&mut self) -> CollectionId {
        let id = CollectionId::from(self.scratchpads.len());
        let (depth, parent) = match self.current {
            Some(parent) => (self.scratchpads[parent.index()].depth + 1, Some(parent)),
            None => (0, None),
        };

        if let Some(parent) = parent {
            self.scratchpads[parent.index()].children.push(id);
        }
        self.scratchpads
            .push(CoordinatorScratchpad::new(id, depth, parent));
        self.current = Some(id);

        id
    }

    fn exit_scope(&mut self, id: CollectionId) {
        self.current = self.scratchpads[id.index()].parent;
    }

    /// Compile a collection into its own plan node and return the accessor
    /// that places its pending collection into the owning element.
    fn collection(
        &mut self,
        shape: &CollectionShape,
    ) -> Result<AccessorPair<Element>, InternalError> {
        if matches!(*shape.element, ShapeNode::Collection(_)) {
            return Err(InternalError::configuration(
                "a collection element cannot itself be a collection",
            ));
        }

        let id = self.enter_scope();
        let element = self.node(&shape.element, element_target(&shape.element))?;

        let declaring_type = element_label(&shape.element);
        let mut key_slots = Vec::with_capacity(shape.keys.len());
        let mut key_readers = Vec::with_capacity(shape.keys.len());
        for key in &shape.keys {
            scalar::validate_key_column(key)?;
            key_slots.push(self.allocate_slot());
            key_readers.push(scalar::key_reader(
                key,
                scalar::key_target(key, &declaring_type),
            ));
        }

        let discriminator = match &shape.discriminator {
            Some((column, value)) => {
                scalar::validate_tag(column, value)?;
                Some(polymorphic::discriminator_test(column, value))
            }
            None => None,
        };

        let depth = self.scratchpads[id.index()].depth;
        let padding = (depth > 0 && !shape.keys.is_empty()).then(|| {
            AccessorPair::shared(any_key_present(
                shape.keys.iter().map(|k| k.ordinal).collect(),
            ))
        });
        let has_data = combine_has_data(discriminator, padding);

        let state_slot = self.allocate_slot();
        let pad = &mut self.scratchpads[id.index()];
        pad.state_slot = Some(state_slot);
        pad.key_slots = key_slots;
        pad.key_readers = key_readers;
        pad.has_data = has_data;
        pad.element = Some(element);
        self.exit_scope(id);

        let placeholder: Accessor<Element> = accessor(move |ctx| {
            let owner = ctx.coordinator(state_slot)?;
            Ok(Element::Collection(Collection::pending(owner)))
        });

        Ok(AccessorPair::shared(placeholder))
    }
}

/// Outer-join padding test: a nested row carries data for a collection
/// only when at least one of its key columns is non-null.
fn any_key_present(ordinals: Vec<usize>) -> Accessor<bool> {
    accessor(move |ctx| {
        for ordinal in &ordinals {
            if !ctx.is_null(*ordinal)? {
                return Ok(true);
            }
        }

        Ok(false)
    })
}

fn combine_has_data(
    left: Option<AccessorPair<bool>>,
    right: Option<AccessorPair<bool>>,
) -> Option<AccessorPair<bool>> {
    match (left, right) {
        (Some(left), Some(right)) => Some(AccessorPair::new(
            both(left.fast, right.fast),
            both(left.diagnostic, right.diagnostic),
        )),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

fn both(left: Accessor<bool>, right: Accessor<bool>) -> Accessor<bool> {
    accessor(move |ctx| Ok(left(ctx)? && right(ctx)?))
}

/// Diagnostic target for a collection's elements.
fn element_target(element: &ShapeNode) -> ColumnTarget {
    match element {
        ShapeNode::Scalar(scalar) => scalar::column_target(scalar),
        _ => ColumnTarget::Column { name: None },
    }
}

/// Name diagnostics give the owner of a collection's key columns.
fn element_label(element: &ShapeNode) -> String {
    match element {
        ShapeNode::Structure(structure) => structure.type_name.clone(),
        other => other.kind().to_string(),
    }
}
