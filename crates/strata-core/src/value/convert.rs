use crate::{
    collection::{List, Map},
    model::Model,
    value::Value,
};
use std::sync::Arc;

///
/// FromValue
///
/// Typed projection out of a dynamic `Value`.
/// Returns `None` when the value has a different shape.
///

pub trait FromValue: Sized {
    /// Label used in type-mismatch diagnostics.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(v) => Some(*v as Self),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_text().map(ToString::to_string)
    }
}

impl FromValue for Arc<str> {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(Self::clone(v)),
            _ => None,
        }
    }
}

impl FromValue for List<Value> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_list().cloned()
    }
}

impl FromValue for Map<Arc<str>, Value> {
    const EXPECTED: &'static str = "map";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_map().cloned()
    }
}

impl FromValue for Model {
    const EXPECTED: &'static str = "model";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_model().cloned()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

///
/// Into<Value>
///

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(v: Arc<str>) -> Self {
        Self::Text(v)
    }
}

impl From<List<Value>> for Value {
    fn from(v: List<Self>) -> Self {
        Self::List(v)
    }
}

impl From<Map<Arc<str>, Value>> for Value {
    fn from(v: Map<Arc<str>, Self>) -> Self {
        Self::Map(v)
    }
}

impl From<Model> for Value {
    fn from(v: Model) -> Self {
        Self::Model(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
