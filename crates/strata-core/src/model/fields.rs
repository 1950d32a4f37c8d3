use crate::{
    derive::KeyPath,
    model::{ModelError, Schema, schema::Slot},
    value::{FromValue, Value},
};

///
/// Fields
///
/// Read-only view of an instance's base fields, handed to dependency
/// predicates and compute functions. Derived fields are not visible here.
///

#[derive(Clone, Copy)]
pub struct Fields<'a> {
    schema: &'a Schema,
    base: &'a [Value],
}

impl<'a> Fields<'a> {
    pub(crate) const fn new(schema: &'a Schema, base: &'a [Value]) -> Self {
        Self { schema, base }
    }

    #[must_use]
    pub const fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Read a base field by name.
    pub fn get(&self, name: &str) -> Result<&'a Value, ModelError> {
        match self.schema.table().slot(name) {
            Some(Slot::Base(slot)) => Ok(&self.base[slot]),
            Some(Slot::Derived(_)) => Err(ModelError::derived(self.schema.name(), name)),
            None => Err(ModelError::unknown(self.schema.name(), name)),
        }
    }

    /// Read a base field and project it into `T`.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T, ModelError> {
        let value = self.get(name)?;

        T::from_value(value).ok_or_else(|| ModelError::TypeMismatch {
            schema: self.schema.name().to_string(),
            field: name.to_string(),
            expected: T::EXPECTED,
            actual: value.kind(),
        })
    }

    /// Text field shorthand; `None` for non-text values.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.get(name).ok().and_then(Value::as_text)
    }

    /// Walk a resolved path. Any hop through a non-model value (including
    /// null) yields `None`.
    #[must_use]
    pub fn resolve(&self, path: &KeyPath) -> Option<&'a Value> {
        let (last, hops) = path.slots().split_last()?;
        let mut base = self.base;

        for slot in hops {
            match base.get(*slot)? {
                Value::Model(model) => base = model.base_values(),
                _ => return None,
            }
        }

        base.get(*last)
    }

    /// Base fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.schema.base_field_names().zip(self.base.iter())
    }
}
