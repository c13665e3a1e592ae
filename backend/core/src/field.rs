//! Typed key/value pairs attached to a record.

use std::borrow::Cow;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// A typed field value. Serializes to its natural JSON shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    /// Durations are encoded in seconds as a float.
    Duration(Duration),
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Str(s) => serde_json::Value::String(s.clone()),
            FieldValue::I64(n) => serde_json::Value::from(*n),
            FieldValue::U64(n) => serde_json::Value::from(*n),
            FieldValue::F64(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(n.to_string())),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Duration(d) => serde_json::Number::from_f64(d.as_secs_f64())
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Json(v) => v.clone(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Str(s) => serializer.serialize_str(s),
            FieldValue::I64(n) => serializer.serialize_i64(*n),
            FieldValue::U64(n) => serializer.serialize_u64(*n),
            FieldValue::F64(n) if n.is_finite() => serializer.serialize_f64(*n),
            FieldValue::F64(n) => serializer.serialize_str(&n.to_string()),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Duration(d) => serializer.serialize_f64(d.as_secs_f64()),
            FieldValue::Json(v) => v.serialize(serializer),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident as $cast:ty),* $(,)?) => {
        $(impl From<$ty> for FieldValue {
            fn from(v: $ty) -> Self {
                FieldValue::$variant(v as $cast)
            }
        })*
    };
}

impl_from!(
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    isize => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    usize => U64 as u64,
    f32 => F64 as f64,
    f64 => F64 as f64,
);

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Str(v.clone())
    }
}

impl From<Duration> for FieldValue {
    fn from(v: Duration) -> Self {
        FieldValue::Duration(v)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Json(v)
    }
}

/// One `(key, value)` pair. Order of fields on a record is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: Cow<'static, str>,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn str(key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::Str(value.into()))
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self::new(key, FieldValue::I64(value))
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    pub fn json(key: impl Into<Cow<'static, str>>, value: serde_json::Value) -> Self {
        Self::new(key, FieldValue::Json(value))
    }

    /// `error` field holding the display form of `err`.
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::new("error", FieldValue::Str(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_pick_natural_variant() {
        assert_eq!(Field::new("n", 100).value, FieldValue::I64(100));
        assert_eq!(Field::new("n", 7u32).value, FieldValue::U64(7));
        assert_eq!(Field::new("s", "x").value, FieldValue::Str("x".into()));
        assert_eq!(Field::new("b", true).value, FieldValue::Bool(true));
    }

    #[test]
    fn serializes_inner_value() {
        let v = serde_json::to_value(FieldValue::I64(100)).unwrap();
        assert_eq!(v, serde_json::json!(100));
        let d = serde_json::to_value(FieldValue::Duration(Duration::from_millis(1500))).unwrap();
        assert_eq!(d, serde_json::json!(1.5));
        let nan = serde_json::to_value(FieldValue::F64(f64::NAN)).unwrap();
        assert_eq!(nan, serde_json::json!("NaN"));
    }

    #[test]
    fn error_field_uses_display() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let field = Field::error(&err);
        assert_eq!(field.key, "error");
        assert_eq!(field.value, FieldValue::Str("disk full".into()));
    }
}
