//! Boundary serialization.
//!
//! [`SerializedValue`] is the plain, schema-free form an instance takes when
//! it leaves the process. Encoding is infallible and emits base fields only;
//! decoding rebuilds instances through `Schema::create`, so every rule of
//! construction applies to wire input as well.

mod bulk;
mod codec;
mod error;
mod model;
mod value;


pub use bulk::{
    ItemConfig, deserialize_array, deserialize_async_array, deserialize_async_map,
    deserialize_map, deserialize_to_list, deserialize_to_map, serialize_array, serialize_map,
};
pub use codec::{CodecError, decode_cbor, encode_cbor, from_json, to_json};
pub use error::DeserializeError;
pub use model::{AsyncExtraConfig, ExtraConfig, Resolve};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

///
/// SerializedValue
///
/// Schema-free boundary value. Maps keep insertion order.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SerializedValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Self>),
    Map(IndexMap<String, Self>),
}

impl SerializedValue {
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Self>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

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
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Look up a key of a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map().and_then(|entries| entries.get(key))
    }
}

impl From<bool> for SerializedValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SerializedValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for SerializedValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for SerializedValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SerializedValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SerializedValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

///
/// Serializable
///
/// Infallible conversion into the boundary form.
///

pub trait Serializable {
    fn serialize(&self) -> SerializedValue;
}

///
/// Deserializer
///
/// Synchronous decode from the boundary form. `Config` carries whatever the
/// wire does not (extra field values, limits).
///

pub trait Deserializer {
    type Output;
    type Config;

    fn deserialize(
        &self,
        value: &SerializedValue,
        config: &Self::Config,
    ) -> Result<Self::Output, DeserializeError>;
}

///
/// AsyncDeserializer
///
/// Decode that may await external lookups. The returned future owns
/// everything it needs and does not borrow the deserializer.
///

pub trait AsyncDeserializer {
    type Output: Send + 'static;
    type Config: Send + 'static;

    fn deserialize_async(
        &self,
        value: SerializedValue,
        config: Self::Config,
    ) -> BoxFuture<'static, Result<Self::Output, DeserializeError>>;
}
