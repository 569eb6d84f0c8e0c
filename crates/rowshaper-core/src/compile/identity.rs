use crate::{
    compile::{PlanCompiler, scalar::read_tolerant},
    element::{Element, EntityKey},
    error::{ColumnTarget, InternalError},
    plan::{AccessorPair, accessor},
    session::RowContext,
    shape::{EntitySetSource, IdentityShape, ScalarShape},
    value::Value,
};

///
/// IdentityAccessor
///
/// Compiled entity identity: the null-test column and the key builder.
/// The key is `None` for detached entities and for rows whose entity set
/// could not be determined.
///

#[derive(Clone)]
pub(crate) struct IdentityAccessor {
    pub(crate) null_test: usize,
    pub(crate) key: AccessorPair<Option<EntityKey>>,
}

impl IdentityAccessor {
    pub(crate) fn read_key(
        &self,
        ctx: &mut RowContext<'_>,
        diagnostic: bool,
    ) -> Result<Option<EntityKey>, InternalError> {
        if diagnostic {
            (self.key.diagnostic)(ctx)
        } else {
            (self.key.fast)(ctx)
        }
    }
}

impl PlanCompiler<'_> {
    /// Compile an entity identity; `target` names each key column in
    /// diagnostics.
    pub(super) fn identity(
        &mut self,
        identity: &IdentityShape,
        target: impl Fn(&ScalarShape) -> ColumnTarget,
    ) -> Result<IdentityAccessor, InternalError> {
        let Some(first) = identity.keys.first() else {
            return Err(InternalError::configuration(
                "entity identity must declare at least one key column",
            ));
        };
        let null_test = first.ordinal;
        let keys: Vec<_> = identity
            .keys
            .iter()
            .map(|key| (key.clone(), target(key)))
            .collect();

        let key = match &identity.entity_set {
            EntitySetSource::Fixed(set) => {
                let set = set.clone();

                AccessorPair::from_fn(move |ctx, diagnostic| {
                    let values = read_keys(ctx, &keys, diagnostic)?;
                    Ok(Some(EntityKey::new(set.clone(), values)))
                })
            }

            EntitySetSource::Discriminated { column, sets } => {
                if sets.is_empty() {
                    return Err(InternalError::configuration(format!(
                        "discriminated entity set on column {} lists no entity sets",
                        column.ordinal
                    )));
                }

                // The chosen set is parked in a slot for the rest of the build.
                let slot = self.allocate_slot();
                let column_target = target(column);
                let column = column.clone();
                let sets = sets.clone();

                AccessorPair::from_fn(move |ctx, diagnostic| {
                    let chosen = read_tolerant(ctx, &column, diagnostic.then_some(&column_target))?
                        .as_i64()
                        .and_then(|position| usize::try_from(position).ok())
                        .and_then(|position| sets.get(position))
                        .cloned();
                    ctx.set_entity_set(slot, chosen);

                    let Some(set) = ctx.entity_set(slot)? else {
                        return Ok(None);
                    };
                    let values = read_keys(ctx, &keys, diagnostic)?;

                    Ok(Some(EntityKey::new(set, values)))
                })
            }

            EntitySetSource::Detached => AccessorPair::shared(accessor(|_| Ok(None))),
        };

        Ok(IdentityAccessor { null_test, key })
    }

    /// Reference to a related entity: its key, or null when the first key
    /// column is null or no entity set applies.
    pub(super) fn reference(
        &mut self,
        identity: &IdentityShape,
        target: &ColumnTarget,
    ) -> Result<AccessorPair<Element>, InternalError> {
        let identity = self.identity(identity, |_| target.clone())?;

        Ok(AccessorPair::from_fn(move |ctx, diagnostic| {
            if ctx.is_null(identity.null_test)? {
                return Ok(Element::Null);
            }

            Ok(identity
                .read_key(ctx, diagnostic)?
                .map_or(Element::Null, Element::Reference))
        }))
    }
}

fn read_keys(
    ctx: &RowContext<'_>,
    keys: &[(ScalarShape, ColumnTarget)],
    diagnostic: bool,
) -> Result<Vec<Value>, InternalError> {
    keys.iter()
        .map(|(key, target)| read_tolerant(ctx, key, diagnostic.then_some(target)))
        .collect()
}
