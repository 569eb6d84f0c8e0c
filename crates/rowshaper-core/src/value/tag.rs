use crate::value::Value;
use std::fmt;

///
/// ScalarType
///
/// Declared type of a scalar column read.
///
/// `Any` accepts every non-null value unchanged. `Text`, `Blob` and `Any`
/// are reference representations and always tolerate nulls.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ScalarType {
    Any,
    Blob,
    Bool,
    Decimal,
    Float32,
    Float64,
    Int16,
    Int32,
    Int64,
    Text,
    Timestamp,
    Uint8,
    Ulid,
}

impl ScalarType {
    /// Stable byte tag used by shape keys.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Any => 1,
            Self::Blob => 2,
            Self::Bool => 3,
            Self::Decimal => 4,
            Self::Float32 => 5,
            Self::Float64 => 6,
            Self::Int16 => 7,
            Self::Int32 => 8,
            Self::Int64 => 9,
            Self::Text => 10,
            Self::Timestamp => 11,
            Self::Uint8 => 12,
            Self::Ulid => 13,
        }
    }

    /// Stable human-readable label for diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Blob => "Blob",
            Self::Bool => "Bool",
            Self::Decimal => "Decimal",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Text => "Text",
            Self::Timestamp => "Timestamp",
            Self::Uint8 => "Uint8",
            Self::Ulid => "Ulid",
        }
    }

    /// Reference representations read nulls without a null guard.
    #[must_use]
    pub const fn is_reference_repr(self) -> bool {
        matches!(self, Self::Any | Self::Blob | Self::Text)
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Int16 | Self::Int32 | Self::Int64 | Self::Uint8)
    }

    /// Whether a non-null value can be read as this type without conversion.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => false,
            (Self::Any, _)
            | (Self::Blob, Value::Blob(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::Decimal, Value::Decimal(_))
            | (Self::Float32, Value::Float32(_))
            | (Self::Float64, Value::Float64(_))
            | (Self::Int16, Value::Int16(_))
            | (Self::Int32, Value::Int32(_))
            | (Self::Int64, Value::Int64(_))
            | (Self::Text, Value::Text(_))
            | (Self::Timestamp, Value::Timestamp(_))
            | (Self::Uint8, Value::Uint8(_))
            | (Self::Ulid, Value::Ulid(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
