use crate::{
    compile::{PlanCompiler, identity::IdentityAccessor, scalar::key_target},
    element::{Element, MergeOption},
    error::{ColumnTarget, InternalError},
    plan::{AccessorPair, MaterializeMode, accessor},
    record::{ColumnKind, RecordColumn, RecordState, RecordStateFactory},
    session::RowContext,
    shape::{ShapeNode, StructureShape},
    traits::{MappingTarget, TypeMapping},
};
use std::{collections::BTreeSet, sync::Arc};

///
/// ObjectSpec
///
/// Everything an object-building accessor needs, shared by its fast and
/// diagnostic twins.
///

struct ObjectSpec {
    type_name: String,
    properties: Vec<(String, AccessorPair<Element>)>,
    null_sentinel: Option<usize>,
    identity: Option<IdentityAccessor>,
    merge_option: MergeOption,
}

///
/// RecordSpec
///

struct RecordSpec {
    factory: Arc<RecordStateFactory>,
    null_sentinel: Option<usize>,
    identity: Option<IdentityAccessor>,
}

impl PlanCompiler<'_> {
    /// Resolve how a structure type materializes.
    pub(super) fn mapping(&self, type_name: &str) -> Result<TypeMapping, InternalError> {
        if self.ctx.mode == MaterializeMode::Records {
            return Ok(TypeMapping::record());
        }

        self.ctx.catalog.resolve(type_name).ok_or_else(|| {
            InternalError::configuration(format!("type '{type_name}' is not mapped"))
        })
    }

    pub(super) fn structure(
        &mut self,
        shape: &StructureShape,
    ) -> Result<AccessorPair<Element>, InternalError> {
        let mapping = self.mapping(&shape.type_name)?;
        if mapping.is_abstract {
            return Err(InternalError::configuration(format!(
                "abstract type '{}' cannot be materialized",
                shape.type_name
            )));
        }

        self.concrete_structure(shape, mapping.target)
    }

    /// Compile a structure whose mapping is already known to be concrete.
    pub(super) fn concrete_structure(
        &mut self,
        shape: &StructureShape,
        target: MappingTarget,
    ) -> Result<AccessorPair<Element>, InternalError> {
        validate_property_names(shape)?;

        let mut properties = Vec::with_capacity(shape.properties.len());
        for property in &shape.properties {
            let column = ColumnTarget::Property {
                property: property.name.clone(),
                declaring_type: shape.type_name.clone(),
            };
            let pair = self.node(&property.node, column)?;
            properties.push((property.name.clone(), column_kind(&property.node), pair));
        }

        let identity = match &shape.identity {
            Some(identity) => {
                Some(self.identity(identity, |key| key_target(key, &shape.type_name))?)
            }
            None => None,
        };

        match target {
            MappingTarget::Object => Ok(object_accessors(ObjectSpec {
                type_name: shape.type_name.clone(),
                properties: properties
                    .into_iter()
                    .map(|(name, _, pair)| (name, pair))
                    .collect(),
                null_sentinel: shape.null_sentinel,
                identity,
                merge_option: self.ctx.merge_option,
            })),
            MappingTarget::Record => {
                let columns = properties
                    .into_iter()
                    .map(|(name, kind, gather)| RecordColumn { name, kind, gather })
                    .collect();

                Ok(record_accessors(RecordSpec {
                    factory: Arc::new(RecordStateFactory::new(&shape.type_name, columns)),
                    null_sentinel: shape.null_sentinel,
                    identity,
                }))
            }
        }
    }
}

fn validate_property_names(shape: &StructureShape) -> Result<(), InternalError> {
    let mut seen = BTreeSet::new();

    for property in &shape.properties {
        if property.name.is_empty() {
            return Err(InternalError::configuration(format!(
                "type '{}' declares a property without a name",
                shape.type_name
            )));
        }
        if !seen.insert(property.name.as_str()) {
            return Err(InternalError::configuration(format!(
                "type '{}' declares property '{}' more than once",
                shape.type_name, property.name
            )));
        }
    }

    Ok(())
}

const fn column_kind(node: &ShapeNode) -> ColumnKind {
    match node {
        ShapeNode::Scalar(scalar) => ColumnKind::Scalar(scalar.scalar_type),
        ShapeNode::Collection(_) => ColumnKind::Collection,
        ShapeNode::Reference(_) => ColumnKind::Reference,
        ShapeNode::Structure(_)
        | ShapeNode::Polymorphic(_)
        | ShapeNode::MultiDiscriminator(_)
        | ShapeNode::VarRef(_) => ColumnKind::Structure,
    }
}

/// Whether this row carries no instance: null sentinel or null first key.
fn is_null_instance(
    ctx: &RowContext<'_>,
    null_sentinel: Option<usize>,
    identity: Option<&IdentityAccessor>,
) -> Result<bool, InternalError> {
    if let Some(ordinal) = null_sentinel
        && ctx.is_null(ordinal)?
    {
        return Ok(true);
    }

    if let Some(identity) = identity
        && ctx.is_null(identity.null_test)?
    {
        return Ok(true);
    }

    Ok(false)
}

fn object_accessors(spec: ObjectSpec) -> AccessorPair<Element> {
    let spec = Arc::new(spec);
    let fast_spec = Arc::clone(&spec);

    AccessorPair::new(
        accessor(move |ctx| build_object(ctx, &fast_spec, false)),
        accessor(move |ctx| build_object(ctx, &spec, true)),
    )
}

fn build_object(
    ctx: &mut RowContext<'_>,
    spec: &ObjectSpec,
    diagnostic: bool,
) -> Result<Element, InternalError> {
    if is_null_instance(ctx, spec.null_sentinel, spec.identity.as_ref())? {
        return Ok(Element::Null);
    }

    let key = match &spec.identity {
        Some(identity) => identity.read_key(ctx, diagnostic)?,
        None => None,
    };

    let factory = ctx.factory();
    let mut object = factory.create(&spec.type_name)?;
    for (name, pair) in &spec.properties {
        let value = if diagnostic {
            (pair.diagnostic)(ctx)?
        } else {
            (pair.fast)(ctx)?
        };
        factory.set_property(&mut object, name, value)?;
    }

    if let Some(key) = key {
        object.key = Some(key.clone());
        object = ctx.identity().resolve(&key, object, spec.merge_option)?;
    }

    Ok(Element::Object(object))
}

fn record_accessors(spec: RecordSpec) -> AccessorPair<Element> {
    let spec = Arc::new(spec);
    let fast_spec = Arc::clone(&spec);

    AccessorPair::new(
        accessor(move |ctx| build_record(ctx, &fast_spec, false)),
        accessor(move |ctx| build_record(ctx, &spec, true)),
    )
}

fn build_record(
    ctx: &mut RowContext<'_>,
    spec: &RecordSpec,
    diagnostic: bool,
) -> Result<Element, InternalError> {
    let mut record = RecordState::new(Arc::clone(&spec.factory));

    if is_null_instance(ctx, spec.null_sentinel, spec.identity.as_ref())? {
        record.set_null_record();
        return Ok(Element::Record(record));
    }

    let key = match &spec.identity {
        Some(identity) => identity.read_key(ctx, diagnostic)?,
        None => None,
    };

    record.gather_data(ctx, diagnostic)?;
    record.set_entity_key(key);

    Ok(Element::Record(record))
}
