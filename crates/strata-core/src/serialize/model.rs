use crate::{
    collection::{List, Map},
    config::DecodeConfig,
    model::{Model, Schema, Shape},
    serialize::{
        AsyncDeserializer, DeserializeError, Deserializer, Serializable, SerializedValue,
        value::plain,
    },
    value::Value,
};
use futures::{
    FutureExt,
    future::{BoxFuture, try_join_all},
};
use std::{fmt, sync::Arc};

///
/// ExtraConfig
///
/// Field values supplied by the caller instead of the wire, plus decode
/// limits. Extra values override serialized fields of the same name.
///

#[derive(Clone, Debug, Default)]
pub struct ExtraConfig {
    pub values: Map<Arc<str>, Value>,
    pub limits: DecodeConfig,
}

impl ExtraConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.values = self.values.set(name.into(), value.into());
        self
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: DecodeConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Config for nested instances: same limits, no extra values.
    fn nested(&self) -> Self {
        Self {
            values: Map::new(),
            limits: self.limits,
        }
    }

    fn merge(&self, values: &mut Vec<(Arc<str>, Value)>) {
        values.extend(self.values.iter().map(|(k, v)| (Arc::clone(k), v.clone())));
    }
}

///
/// Resolve
///
/// Turns the key of a reference field back into an instance of the
/// referenced schema. Closures returning a boxed future implement it.
///

pub trait Resolve: Send + Sync {
    fn resolve(
        &self,
        schema: &Schema,
        key: SerializedValue,
    ) -> BoxFuture<'static, Result<Model, DeserializeError>>;
}

impl<F> Resolve for F
where
    F: Fn(&Schema, SerializedValue) -> BoxFuture<'static, Result<Model, DeserializeError>>
        + Send
        + Sync,
{
    fn resolve(
        &self,
        schema: &Schema,
        key: SerializedValue,
    ) -> BoxFuture<'static, Result<Model, DeserializeError>> {
        self(schema, key)
    }
}

/// In-memory lookup by text key.
impl Resolve for Map<Arc<str>, Model> {
    fn resolve(
        &self,
        schema: &Schema,
        key: SerializedValue,
    ) -> BoxFuture<'static, Result<Model, DeserializeError>> {
        let result = match &key {
            SerializedValue::Text(text) => self
                .get(text.as_str())
                .cloned()
                .ok_or_else(|| DeserializeError::MissingKey { key: text.clone() })
                .and_then(|model| ensure_schema(schema, model)),
            other => Err(DeserializeError::shape("text", other.kind())),
        };

        futures::future::ready(result).boxed()
    }
}

fn ensure_schema(schema: &Schema, model: Model) -> Result<Model, DeserializeError> {
    if model.schema().ptr_eq(schema) {
        Ok(model)
    } else {
        Err(DeserializeError::Resolve(format!(
            "expected instance of '{}', got '{}'",
            schema.name(),
            model.schema().name()
        )))
    }
}

///
/// AsyncExtraConfig
///

#[derive(Clone, Default)]
pub struct AsyncExtraConfig {
    pub extra: ExtraConfig,
    pub resolver: Option<Arc<dyn Resolve>>,
}

impl AsyncExtraConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_extra(mut self, extra: ExtraConfig) -> Self {
        self.extra = extra;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: impl Resolve + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    fn nested(&self) -> Self {
        Self {
            extra: self.extra.nested(),
            resolver: self.resolver.clone(),
        }
    }
}

impl fmt::Debug for AsyncExtraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncExtraConfig")
            .field("extra", &self.extra)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

///
/// Serializable
///

/// Base fields in declaration order; derived fields never leave the process.
/// A reference field is written as the referenced instance's key field.
impl Serializable for Model {
    fn serialize(&self) -> SerializedValue {
        let entries = self
            .schema()
            .table()
            .base()
            .iter()
            .zip(self.base_values())
            .map(|(field, value)| {
                let wire = match (&field.shape, value) {
                    (Shape::Reference { key, .. }, Value::Model(target)) => target
                        .get(key)
                        .map_or(SerializedValue::Null, Serializable::serialize),
                    _ => value.serialize(),
                };

                (field.name.to_string(), wire)
            })
            .collect();

        SerializedValue::Map(entries)
    }
}

///
/// Deserializer
///

impl Deserializer for Schema {
    type Output = Model;
    type Config = ExtraConfig;

    fn deserialize(
        &self,
        value: &SerializedValue,
        config: &ExtraConfig,
    ) -> Result<Model, DeserializeError> {
        decode_model(self, value, config, 0)
    }
}

fn check_depth(limits: &DecodeConfig, depth: usize) -> Result<(), DeserializeError> {
    if depth > limits.max_depth {
        return Err(DeserializeError::DepthExceeded {
            max_depth: limits.max_depth,
        });
    }

    Ok(())
}

fn decode_model(
    schema: &Schema,
    wire: &SerializedValue,
    extra: &ExtraConfig,
    depth: usize,
) -> Result<Model, DeserializeError> {
    check_depth(&extra.limits, depth)?;
    if schema.has_references() {
        return Err(DeserializeError::AsyncRequired {
            schema: schema.name().to_string(),
        });
    }

    let entries = wire
        .as_map()
        .ok_or_else(|| DeserializeError::shape("map", wire.kind()))?;

    let nested = extra.nested();
    let mut values: Vec<(Arc<str>, Value)> =
        Vec::with_capacity(entries.len() + extra.values.size());
    for (name, item) in entries {
        if extra.values.has(name.as_str()) {
            continue;
        }

        let shape = schema.assignable_shape(name)?;
        let value =
            decode_field(shape, item, &nested, depth).map_err(|err| err.with_field(name))?;
        values.push((Arc::from(name.as_str()), value));
    }
    extra.merge(&mut values);

    Ok(schema.create(values)?)
}

fn decode_field(
    shape: &Shape,
    item: &SerializedValue,
    nested: &ExtraConfig,
    depth: usize,
) -> Result<Value, DeserializeError> {
    match (shape, item) {
        (Shape::Any, item) => Ok(plain(item)),
        (_, SerializedValue::Null) => Ok(Value::Null),
        (Shape::Model(schema), item) => {
            decode_model(schema, item, nested, depth + 1).map(Value::Model)
        }
        (Shape::ListOf(schema), SerializedValue::List(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                decode_model(schema, item, nested, depth + 1)
                    .map(Value::Model)
                    .map_err(|err| err.with_index(index))
            })
            .collect::<Result<List<Value>, _>>()
            .map(Value::List),
        (Shape::MapOf(schema), SerializedValue::Map(entries)) => entries
            .iter()
            .map(|(key, item)| {
                decode_model(schema, item, nested, depth + 1)
                    .map(|model| (Arc::from(key.as_str()), Value::Model(model)))
                    .map_err(|err| err.with_field(key))
            })
            .collect::<Result<Map<Arc<str>, Value>, _>>()
            .map(Value::Map),
        (Shape::ListOf(_), other) => Err(DeserializeError::shape("list", other.kind())),
        (Shape::MapOf(_), other) => Err(DeserializeError::shape("map", other.kind())),
        (Shape::Reference { schema, .. }, _) => Err(DeserializeError::AsyncRequired {
            schema: schema.name().to_string(),
        }),
    }
}

///
/// AsyncDeserializer
///

impl AsyncDeserializer for Schema {
    type Output = Model;
    type Config = AsyncExtraConfig;

    fn deserialize_async(
        &self,
        value: SerializedValue,
        config: AsyncExtraConfig,
    ) -> BoxFuture<'static, Result<Model, DeserializeError>> {
        decode_model_async(self.clone(), value, config, 0)
    }
}

fn decode_model_async(
    schema: Schema,
    wire: SerializedValue,
    config: AsyncExtraConfig,
    depth: usize,
) -> BoxFuture<'static, Result<Model, DeserializeError>> {
    async move {
        check_depth(&config.extra.limits, depth)?;
        let entries = match wire {
            SerializedValue::Map(entries) => entries,
            other => return Err(DeserializeError::shape("map", other.kind())),
        };

        let mut fields = Vec::with_capacity(entries.len());
        for (name, item) in entries {
            if config.extra.values.has(name.as_str()) {
                continue;
            }

            let shape = schema.assignable_shape(&name)?.clone();
            let nested = config.nested();
            fields.push(async move {
                let value = decode_field_async(shape, item, nested, depth)
                    .await
                    .map_err(|err| err.with_field(&name))?;

                Ok::<_, DeserializeError>((Arc::<str>::from(name), value))
            });
        }

        let mut values = try_join_all(fields).await?;
        config.extra.merge(&mut values);

        Ok(schema.create(values)?)
    }
    .boxed()
}

fn decode_field_async(
    shape: Shape,
    item: SerializedValue,
    nested: AsyncExtraConfig,
    depth: usize,
) -> BoxFuture<'static, Result<Value, DeserializeError>> {
    async move {
        match (shape, item) {
            (Shape::Any, item) => Ok(plain(&item)),
            (_, SerializedValue::Null) => Ok(Value::Null),
            (Shape::Model(schema), item) => decode_model_async(schema, item, nested, depth + 1)
                .await
                .map(Value::Model),
            (Shape::ListOf(schema), SerializedValue::List(items)) => {
                let pending = items.into_iter().enumerate().map(|(index, item)| {
                    decode_model_async(schema.clone(), item, nested.clone(), depth + 1)
                        .map(move |result| result.map_err(|err| err.with_index(index)))
                });
                let models = try_join_all(pending).await?;

                Ok(Value::List(models.into_iter().map(Value::Model).collect()))
            }
            (Shape::MapOf(schema), SerializedValue::Map(entries)) => {
                let pending = entries.into_iter().map(|(key, item)| {
                    decode_model_async(schema.clone(), item, nested.clone(), depth + 1).map(
                        move |result| {
                            result
                                .map(|model| (Arc::<str>::from(key.as_str()), Value::Model(model)))
                                .map_err(|err| err.with_field(&key))
                        },
                    )
                });
                let entries = try_join_all(pending).await?;

                Ok(Value::Map(entries.into_iter().collect()))
            }
            (Shape::ListOf(_), other) => Err(DeserializeError::shape("list", other.kind())),
            (Shape::MapOf(_), other) => Err(DeserializeError::shape("map", other.kind())),
            (Shape::Reference { schema, .. }, key) => {
                let resolver = nested.resolver.clone().ok_or_else(|| {
                    DeserializeError::Resolve(format!(
                        "no resolver configured for references to '{}'",
                        schema.name()
                    ))
                })?;
                let model = resolver.resolve(&schema, key).await?;

                ensure_schema(&schema, model).map(Value::Model)
            }
        }
    }
    .boxed()
}
