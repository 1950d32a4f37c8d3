use crate::{
    collection::{List, Map},
    serialize::{AsyncDeserializer, DeserializeError, Deserializer, Serializable, SerializedValue},
};
use futures::{
    FutureExt,
    future::{self, BoxFuture, try_join_all},
};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

///
/// ItemConfig
///
/// Config for a bulk decode: one config shared by every item, or one
/// produced per item from its index (arrays) or key (maps).
///

pub enum ItemConfig<'a, K: ?Sized, C> {
    Shared(&'a C),
    PerItem(&'a dyn Fn(&K) -> C),
}

impl<K: ?Sized, C: Clone> ItemConfig<'_, K, C> {
    fn for_item(&self, key: &K) -> C {
        match self {
            Self::Shared(config) => (*config).clone(),
            Self::PerItem(resolve) => resolve(key),
        }
    }
}

pub fn serialize_array<'a, T, I>(items: I) -> SerializedValue
where
    I: IntoIterator<Item = &'a T>,
    T: Serializable + 'a,
{
    SerializedValue::List(items.into_iter().map(Serializable::serialize).collect())
}

pub fn serialize_map<'a, K, T, I>(entries: I) -> SerializedValue
where
    I: IntoIterator<Item = (&'a K, &'a T)>,
    K: AsRef<str> + ?Sized + 'a,
    T: Serializable + 'a,
{
    SerializedValue::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.serialize()))
            .collect(),
    )
}

/// Decode every element of a list value, in input order.
pub fn deserialize_array<D>(
    deserializer: &D,
    value: &SerializedValue,
    config: ItemConfig<'_, usize, D::Config>,
) -> Result<Vec<D::Output>, DeserializeError>
where
    D: Deserializer,
    D::Config: Clone,
{
    let items = value
        .as_list()
        .ok_or_else(|| DeserializeError::shape("list", value.kind()))?;

    let out = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            deserializer
                .deserialize(item, &config.for_item(&index))
                .map_err(|err| err.with_index(index))
        })
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = out.len(), "deserialized array");

    Ok(out)
}

/// Decode every value of a map value, keeping key order.
pub fn deserialize_map<D>(
    deserializer: &D,
    value: &SerializedValue,
    config: ItemConfig<'_, str, D::Config>,
) -> Result<IndexMap<String, D::Output>, DeserializeError>
where
    D: Deserializer,
    D::Config: Clone,
{
    let entries = value
        .as_map()
        .ok_or_else(|| DeserializeError::shape("map", value.kind()))?;

    let out = entries
        .iter()
        .map(|(key, item)| {
            deserializer
                .deserialize(item, &config.for_item(key))
                .map(|output| (key.clone(), output))
                .map_err(|err| err.with_field(key))
        })
        .collect::<Result<IndexMap<_, _>, _>>()?;
    debug!(count = out.len(), "deserialized map");

    Ok(out)
}

pub fn deserialize_to_list<D>(
    deserializer: &D,
    value: &SerializedValue,
    config: ItemConfig<'_, usize, D::Config>,
) -> Result<List<D::Output>, DeserializeError>
where
    D: Deserializer,
    D::Config: Clone,
{
    deserialize_array(deserializer, value, config).map(List::from)
}

pub fn deserialize_to_map<D>(
    deserializer: &D,
    value: &SerializedValue,
    config: ItemConfig<'_, str, D::Config>,
) -> Result<Map<Arc<str>, D::Output>, DeserializeError>
where
    D: Deserializer,
    D::Config: Clone,
{
    let entries = deserialize_map(deserializer, value, config)?;

    Ok(entries
        .into_iter()
        .map(|(key, output)| (Arc::from(key), output))
        .collect())
}

/// Decode every element concurrently. Results keep input order regardless of
/// completion order; the first failure fails the whole batch.
pub fn deserialize_async_array<D>(
    deserializer: &D,
    value: SerializedValue,
    config: ItemConfig<'_, usize, D::Config>,
) -> BoxFuture<'static, Result<Vec<D::Output>, DeserializeError>>
where
    D: AsyncDeserializer,
    D::Config: Clone,
{
    let items = match value {
        SerializedValue::List(items) => items,
        other => {
            return future::ready(Err(DeserializeError::shape("list", other.kind()))).boxed();
        }
    };

    let pending: Vec<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            deserializer
                .deserialize_async(item, config.for_item(&index))
                .map(move |result| result.map_err(|err| err.with_index(index)))
        })
        .collect();

    async move {
        let out = try_join_all(pending).await?;
        debug!(count = out.len(), "deserialized array");

        Ok::<_, DeserializeError>(out)
    }
    .boxed()
}

/// Map counterpart of [`deserialize_async_array`].
pub fn deserialize_async_map<D>(
    deserializer: &D,
    value: SerializedValue,
    config: ItemConfig<'_, str, D::Config>,
) -> BoxFuture<'static, Result<IndexMap<String, D::Output>, DeserializeError>>
where
    D: AsyncDeserializer,
    D::Config: Clone,
{
    let entries = match value {
        SerializedValue::Map(entries) => entries,
        other => {
            return future::ready(Err(DeserializeError::shape("map", other.kind()))).boxed();
        }
    };

    let pending: Vec<_> = entries
        .into_iter()
        .map(|(key, item)| {
            deserializer
                .deserialize_async(item, config.for_item(&key))
                .map(move |result| {
                    result
                        .map_err(|err| err.with_field(&key))
                        .map(|output| (key, output))
                })
        })
        .collect();

    async move {
        let out = try_join_all(pending)
            .await?
            .into_iter()
            .collect::<IndexMap<_, _>>();
        debug!(count = out.len(), "deserialized map");

        Ok::<_, DeserializeError>(out)
    }
    .boxed()
}
