use crate::{
    element::Element,
    error::{ColumnTarget, ConversionError, InternalError, NullViolation},
    plan::{Accessor, AccessorPair, accessor},
    session::RowContext,
    shape::ScalarShape,
    value::{ScalarType, Value},
};

/// Typed column read.
///
/// Without a target this is the fast path and fails with context-free
/// errors; with a target it is the diagnostic path.
pub(crate) fn read_scalar(
    ctx: &RowContext<'_>,
    shape: &ScalarShape,
    target: Option<&ColumnTarget>,
) -> Result<Value, InternalError> {
    let value = ctx.read(shape.ordinal)?;

    if value.is_null() {
        if shape.accepts_null() {
            return Ok(Value::Null);
        }

        return Err(match target {
            None => InternalError::null_cast(shape.scalar_type),
            Some(target) => InternalError::null_violation(NullViolation {
                expected: shape.scalar_type,
                ordinal: shape.ordinal,
                target: target.clone(),
            }),
        });
    }

    if !shape.scalar_type.accepts(value) {
        return Err(match target {
            None => InternalError::invalid_cast(shape.scalar_type),
            Some(target) => InternalError::conversion(ConversionError {
                expected: shape.scalar_type,
                found: value.kind_label(),
                ordinal: shape.ordinal,
                target: target.clone(),
            }),
        });
    }

    Ok(value.clone())
}

/// Key and discriminator read: nulls pass through regardless of the
/// declared nullability, non-null values must match the declared type.
pub(crate) fn read_tolerant(
    ctx: &RowContext<'_>,
    shape: &ScalarShape,
    target: Option<&ColumnTarget>,
) -> Result<Value, InternalError> {
    if ctx.is_null(shape.ordinal)? {
        return Ok(Value::Null);
    }

    read_scalar(ctx, shape, target)
}

pub(crate) fn compile_scalar(shape: &ScalarShape, target: ColumnTarget) -> AccessorPair<Element> {
    let fast_shape = shape.clone();
    let fast: Accessor<Element> = accessor(move |ctx| {
        read_scalar(ctx, &fast_shape, None).map(Element::from)
    });

    let diagnostic_shape = shape.clone();
    let diagnostic: Accessor<Element> = accessor(move |ctx| {
        read_scalar(ctx, &diagnostic_shape, Some(&target)).map(Element::from)
    });

    AccessorPair::new(fast, diagnostic)
}

pub(crate) fn key_reader(shape: &ScalarShape, target: ColumnTarget) -> AccessorPair<Value> {
    let shape = shape.clone();

    AccessorPair::from_fn(move |ctx, diagnostic| {
        read_tolerant(ctx, &shape, diagnostic.then_some(&target))
    })
}

/// Diagnostic target for a column read on its own.
pub(crate) fn column_target(shape: &ScalarShape) -> ColumnTarget {
    ColumnTarget::Column {
        name: shape.name.clone(),
    }
}

/// Diagnostic target for a key column identifying `declaring_type`.
pub(crate) fn key_target(shape: &ScalarShape, declaring_type: &str) -> ColumnTarget {
    ColumnTarget::Key {
        name: shape.name.clone(),
        declaring_type: declaring_type.to_string(),
    }
}

/// Key columns identify groups; a type-erased column cannot.
pub(crate) fn validate_key_column(shape: &ScalarShape) -> Result<(), InternalError> {
    if shape.scalar_type == ScalarType::Any {
        return Err(InternalError::configuration(format!(
            "key column {} must declare a concrete scalar type",
            shape.ordinal
        )));
    }

    Ok(())
}

/// A declared discriminator value must be non-null and of the column's type.
pub(crate) fn validate_tag(column: &ScalarShape, tag: &Value) -> Result<(), InternalError> {
    let Some(tag_type) = tag.scalar_type() else {
        return Err(InternalError::configuration(format!(
            "discriminator value for column {} must not be null",
            column.ordinal
        )));
    };

    if column.scalar_type != ScalarType::Any && column.scalar_type != tag_type {
        return Err(InternalError::configuration(format!(
            "discriminator value of type {tag_type} does not match column {} of type {}",
            column.ordinal, column.scalar_type
        )));
    }

    Ok(())
}
