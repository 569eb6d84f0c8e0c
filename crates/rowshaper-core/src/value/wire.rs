use crate::value::Value;
use serde::{Serialize, Serializer};
use time::PrimitiveDateTime;

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Blob(v) => serializer.serialize_bytes(v),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Decimal(v) => serializer.collect_str(v),
            Self::Float32(v) => serializer.serialize_f32(*v),
            Self::Float64(v) => serializer.serialize_f64(*v),
            Self::Int16(v) => serializer.serialize_i16(*v),
            Self::Int32(v) => serializer.serialize_i32(*v),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Timestamp(v) => serializer.serialize_str(&format_timestamp(v)),
            Self::Uint8(v) => serializer.serialize_u8(*v),
            Self::Ulid(v) => serializer.collect_str(v),
        }
    }
}

/// ISO-8601 without offset, nanosecond precision.
pub(crate) fn format_timestamp(ts: &PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:09}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second(),
        ts.nanosecond(),
    )
}
