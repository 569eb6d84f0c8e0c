use crate::value::Value;

/// Key equality used by collection key tracking.
///
/// Nulls compare equal to each other so an all-null key is one group.
/// Floats compare by bit pattern so a NaN key does not split every row.
#[must_use]
pub fn key_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
        (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
        _ => left == right,
    }
}

/// Text equality that ignores trailing spaces on either side.
///
/// Fixed-width character columns come back right-padded; discriminator
/// tags must still match their declared values.
#[must_use]
pub fn text_eq_trailing(left: &str, right: &str) -> bool {
    left.trim_end_matches(' ') == right.trim_end_matches(' ')
}

/// Discriminator equality: trailing-space-insensitive for text, integer
/// widths unified, key equality otherwise.
#[must_use]
pub(crate) fn discriminator_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => text_eq_trailing(a, b),
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => key_eq(left, right),
        },
    }
}
