use crate::{
    compile::{
        PlanCompiler,
        scalar::{column_target, read_tolerant, validate_tag},
    },
    element::Element,
    error::{ColumnTarget, InternalError},
    plan::{AccessorPair, accessor},
    session::RowContext,
    shape::{MultiDiscriminatorShape, PolymorphicShape, ScalarShape, TypeChooser},
    value::{ScalarType, Value, discriminator_eq},
};
use std::{collections::BTreeMap, sync::Arc};

///
/// DiscriminatorTable
///
/// Tag → branch dispatch resolved once at compile time.
/// Integer tags of any width share one map; text tags are matched with
/// trailing spaces trimmed; everything else falls back to an ordered scan.
///

#[derive(Clone, Debug)]
pub enum DiscriminatorTable {
    Integer(BTreeMap<i64, usize>),
    Text(BTreeMap<String, usize>),
    Linear(Vec<(Value, usize)>),
}

impl DiscriminatorTable {
    /// Build the table for `column`; duplicate tags are a configuration error.
    pub(crate) fn build(
        column: &ScalarShape,
        entries: Vec<(Value, usize)>,
    ) -> Result<Self, InternalError> {
        for (i, (tag, _)) in entries.iter().enumerate() {
            validate_tag(column, tag)?;
            if entries[..i]
                .iter()
                .any(|(earlier, _)| discriminator_eq(earlier, tag))
            {
                return Err(InternalError::configuration(format!(
                    "discriminator value {tag:?} on column {} is declared more than once",
                    column.ordinal
                )));
            }
        }

        let table = if column.scalar_type.is_integer() {
            Self::Integer(
                entries
                    .into_iter()
                    .filter_map(|(tag, branch)| tag.as_i64().map(|tag| (tag, branch)))
                    .collect(),
            )
        } else if column.scalar_type == ScalarType::Text {
            Self::Text(
                entries
                    .into_iter()
                    .filter_map(|(tag, branch)| {
                        tag.as_text()
                            .map(|tag| (tag.trim_end_matches(' ').to_string(), branch))
                    })
                    .collect(),
            )
        } else {
            Self::Linear(entries)
        };

        Ok(table)
    }

    /// Branch index for a discriminator value; `None` falls through to null.
    #[must_use]
    pub fn lookup(&self, value: &Value) -> Option<usize> {
        match self {
            Self::Integer(map) => value.as_i64().and_then(|v| map.get(&v).copied()),
            Self::Text(map) => value
                .as_text()
                .and_then(|v| map.get(v.trim_end_matches(' ')).copied()),
            Self::Linear(entries) => entries
                .iter()
                .find_map(|(tag, branch)| discriminator_eq(tag, value).then_some(*branch)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(map) => map.len(),
            Self::Text(map) => map.len(),
            Self::Linear(entries) => entries.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collection discriminator: `column == value` on the current row.
pub(super) fn discriminator_test(column: &ScalarShape, value: &Value) -> AccessorPair<bool> {
    let target = column_target(column);
    let column = column.clone();
    let value = value.clone();

    AccessorPair::from_fn(move |ctx, diagnostic| {
        let found = read_tolerant(ctx, &column, diagnostic.then_some(&target))?;
        Ok(!found.is_null() && discriminator_eq(&found, &value))
    })
}

///
/// Dispatch
///

struct Dispatch {
    discriminator: ScalarShape,
    tag_target: ColumnTarget,
    table: DiscriminatorTable,
    branches: Vec<AccessorPair<Element>>,
}

impl PlanCompiler<'_> {
    pub(super) fn polymorphic(
        &mut self,
        shape: &PolymorphicShape,
    ) -> Result<AccessorPair<Element>, InternalError> {
        if shape.choices.is_empty() {
            return Err(InternalError::configuration(format!(
                "polymorphic shape on column {} declares no choices",
                shape.discriminator.ordinal
            )));
        }

        // Validate every tag (including abstract choices) before skipping any.
        let all_tags = shape
            .choices
            .iter()
            .enumerate()
            .map(|(i, (tag, _))| (tag.clone(), i))
            .collect();
        DiscriminatorTable::build(&shape.discriminator, all_tags)?;

        let mut entries = Vec::with_capacity(shape.choices.len());
        let mut branches = Vec::with_capacity(shape.choices.len());
        for (tag, choice) in &shape.choices {
            let mapping = self.mapping(&choice.type_name)?;
            if mapping.is_abstract {
                continue;
            }
            entries.push((tag.clone(), branches.len()));
            branches.push(self.concrete_structure(choice, mapping.target)?);
        }

        let dispatch = Arc::new(Dispatch {
            table: DiscriminatorTable::build(&shape.discriminator, entries)?,
            discriminator: shape.discriminator.clone(),
            tag_target: column_target(&shape.discriminator),
            branches,
        });
        let fast_dispatch = Arc::clone(&dispatch);

        Ok(AccessorPair::new(
            accessor(move |ctx| {
                let tag = read_tolerant(ctx, &fast_dispatch.discriminator, None)?;
                match fast_dispatch.table.lookup(&tag) {
                    Some(branch) => (fast_dispatch.branches[branch].fast)(ctx),
                    None => Ok(Element::Null),
                }
            }),
            accessor(move |ctx| {
                let tag = read_tolerant(ctx, &dispatch.discriminator, Some(&dispatch.tag_target))?;
                match dispatch.table.lookup(&tag) {
                    Some(branch) => (dispatch.branches[branch].diagnostic)(ctx),
                    None => Ok(Element::Null),
                }
            }),
        ))
    }

    pub(super) fn multi_discriminator(
        &mut self,
        shape: &MultiDiscriminatorShape,
    ) -> Result<AccessorPair<Element>, InternalError> {
        if shape.choices.is_empty() {
            return Err(InternalError::configuration(
                "multi-discriminator shape declares no choices",
            ));
        }

        let mut by_type = BTreeMap::new();
        let mut branches = Vec::with_capacity(shape.choices.len());
        for (type_name, choice) in &shape.choices {
            if by_type.contains_key(type_name) {
                return Err(InternalError::configuration(format!(
                    "multi-discriminator shape declares type '{type_name}' more than once"
                )));
            }

            let mapping = self.mapping(&choice.type_name)?;
            if mapping.is_abstract {
                continue;
            }
            by_type.insert(type_name.clone(), branches.len());
            branches.push(self.concrete_structure(choice, mapping.target)?);
        }

        let spec = Arc::new(MultiDispatch {
            discriminators: shape
                .discriminators
                .iter()
                .map(|column| (column.clone(), column_target(column)))
                .collect(),
            chooser: Arc::clone(&shape.chooser),
            by_type,
            branches,
        });
        let fast_spec = Arc::clone(&spec);

        Ok(AccessorPair::new(
            accessor(move |ctx| match fast_spec.choose(ctx, false)? {
                Some(branch) => (fast_spec.branches[branch].fast)(ctx),
                None => Ok(Element::Null),
            }),
            accessor(move |ctx| match spec.choose(ctx, true)? {
                Some(branch) => (spec.branches[branch].diagnostic)(ctx),
                None => Ok(Element::Null),
            }),
        ))
    }
}

///
/// MultiDispatch
///

struct MultiDispatch {
    discriminators: Vec<(ScalarShape, ColumnTarget)>,
    chooser: TypeChooser,
    by_type: BTreeMap<String, usize>,
    branches: Vec<AccessorPair<Element>>,
}

impl MultiDispatch {
    fn choose(&self, ctx: &RowContext<'_>, diagnostic: bool) -> Result<Option<usize>, InternalError> {
        let values = self
            .discriminators
            .iter()
            .map(|(column, target)| read_tolerant(ctx, column, diagnostic.then_some(target)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((self.chooser)(&values).and_then(|type_name| self.by_type.get(&type_name).copied()))
    }
}
