use crate::{
    collection::{List, Map},
    serialize::{Serializable, SerializedValue},
    value::Value,
};

impl Serializable for Value {
    fn serialize(&self) -> SerializedValue {
        match self {
            Self::Null => SerializedValue::Null,
            Self::Bool(v) => SerializedValue::Bool(*v),
            Self::Int(v) => SerializedValue::Int(*v),
            Self::Float(v) => SerializedValue::Float(*v),
            Self::Text(v) => SerializedValue::Text(v.to_string()),
            Self::List(items) => items.serialize(),
            Self::Map(entries) => entries.serialize(),
            Self::Model(model) => model.serialize(),
        }
    }
}

impl<T: Serializable> Serializable for List<T> {
    fn serialize(&self) -> SerializedValue {
        SerializedValue::List(self.iter().map(Serializable::serialize).collect())
    }
}

impl<K, T> Serializable for Map<K, T>
where
    K: AsRef<str>,
    T: Serializable,
{
    fn serialize(&self) -> SerializedValue {
        SerializedValue::Map(
            self.iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.serialize()))
                .collect(),
        )
    }
}

/// Rebuild plain data. Maps become text-keyed `Map`s in wire order.
pub(crate) fn plain(value: &SerializedValue) -> Value {
    match value {
        SerializedValue::Null => Value::Null,
        SerializedValue::Bool(v) => Value::Bool(*v),
        SerializedValue::Int(v) => Value::Int(*v),
        SerializedValue::Float(v) => Value::Float(*v),
        SerializedValue::Text(v) => Value::text(v.as_str()),
        SerializedValue::List(items) => Value::List(items.iter().map(plain).collect()),
        SerializedValue::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.as_str().into(), plain(v)))
                .collect(),
        ),
    }
}
