mod convert;

#[cfg(test)]
mod tests;

use crate::{
    collection::{List, Map},
    model::Model,
};
use std::sync::Arc;

// re-exports
pub use convert::FromValue;

///
/// Value
///
/// Dynamic field value carried by model instances.
///
/// Null   → the field holds nothing (absent nested instance, cleared value).
/// List   → shared, immutable; identity is the backing storage.
/// Map    → shared, immutable, insertion-ordered text keys.
/// Model  → a nested instance; identity is the instance allocation.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Arc<str>),
    List(List<Self>),
    Map(Map<Arc<str>, Self>),
    Model(Model),
}

impl Value {
    /// Build a text value.
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    /// Build a list value from anything convertible into values.
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    /// Build a map value from `(key, value)` pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arc<str>>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Identity comparison used by dependency tracking.
    ///
    /// Scalars and text compare by value; lists, maps and nested models
    /// compare by reference, so two structurally equal but separately built
    /// collections are *not* the same.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a.ptr_eq(b),
            (Self::Map(a), Self::Map(b)) => a.ptr_eq(b),
            (Self::Model(a), Self::Model(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Stable label for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Model(_) => "model",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&List<Self>> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&Map<Arc<str>, Self>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_model(&self) -> Option<&Model> {
        match self {
            Self::Model(v) => Some(v),
            _ => None,
        }
    }

    /// Whether a nested model appears anywhere inside this value.
    #[must_use]
    pub fn contains_model(&self) -> bool {
        match self {
            Self::Model(_) => true,
            Self::List(items) => items.some(Self::contains_model),
            Self::Map(entries) => entries.values().any(Self::contains_model),
            _ => false,
        }
    }
}
