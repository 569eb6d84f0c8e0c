mod compare;
mod decimal;
mod tag;
mod wire;


use time::PrimitiveDateTime;
use ulid::Ulid;

// re-exports
pub use compare::{key_eq, text_eq_trailing};
pub(crate) use compare::discriminator_eq;
pub use decimal::Decimal;
pub use tag::ScalarType;
pub(crate) use wire::format_timestamp as wire_timestamp;

///
/// Value
///
/// One column value as delivered by a row cursor.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Blob(Vec<u8>),
    Bool(bool),
    Decimal(Decimal),
    Float32(f32),
    Float64(f64),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Text(String),
    Timestamp(PrimitiveDateTime),
    Uint8(u8),
    Ulid(Ulid),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Runtime scalar type of this value; `None` for nulls.
    #[must_use]
    pub const fn scalar_type(&self) -> Option<ScalarType> {
        let ty = match self {
            Self::Null => return None,
            Self::Blob(_) => ScalarType::Blob,
            Self::Bool(_) => ScalarType::Bool,
            Self::Decimal(_) => ScalarType::Decimal,
            Self::Float32(_) => ScalarType::Float32,
            Self::Float64(_) => ScalarType::Float64,
            Self::Int16(_) => ScalarType::Int16,
            Self::Int32(_) => ScalarType::Int32,
            Self::Int64(_) => ScalarType::Int64,
            Self::Text(_) => ScalarType::Text,
            Self::Timestamp(_) => ScalarType::Timestamp,
            Self::Uint8(_) => ScalarType::Uint8,
            Self::Ulid(_) => ScalarType::Ulid,
        };

        Some(ty)
    }

    /// Label of the runtime kind, used in conversion diagnostics.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self.scalar_type() {
            Some(ty) => ty.label(),
            None => "Null",
        }
    }

    /// Widen any integer variant to `i64`.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::Uint8(v) => Some(*v as i64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::Uint8(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<PrimitiveDateTime> for Value {
    fn from(v: PrimitiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Ulid> for Value {
    fn from(v: Ulid) -> Self {
        Self::Ulid(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
