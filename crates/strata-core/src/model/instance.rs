use crate::{
    derive::{KeyPath, derive_values},
    model::{DeepUpdate, Fields, ModelError, Schema, schema::Slot},
    value::{FromValue, Value},
};
use std::{fmt, sync::Arc};

///
/// Model
///
/// Immutable instance of a `Schema`.
///
/// Base slots hold caller-supplied values; derived slots hold cached
/// computations. Cloning a `Model` clones a pointer; every update returns a
/// new instance whose untouched slots are the same values as the source.
///

#[derive(Clone)]
pub struct Model(Arc<ModelState>);

struct ModelState {
    schema: Schema,
    base: Box<[Value]>,
    derived: Box<[Value]>,
}

impl Model {
    /// Wrap a validated base state, running the derived engine against
    /// `prev` (`None` on first construction).
    pub(crate) fn assemble(schema: Schema, base: Box<[Value]>, prev: Option<&Self>) -> Self {
        let derived = derive_values(&schema, prev, &Fields::new(&schema, &base));

        Self(Arc::new(ModelState {
            schema,
            base,
            derived,
        }))
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    /// Base-field view, as seen by predicates and computes.
    #[must_use]
    pub fn fields(&self) -> Fields<'_> {
        Fields::new(&self.0.schema, &self.0.base)
    }

    /// Read a base or derived field.
    pub fn get(&self, name: &str) -> Result<&Value, ModelError> {
        match self.schema().table().slot(name) {
            Some(Slot::Base(slot)) => Ok(&self.0.base[slot]),
            Some(Slot::Derived(slot)) => Ok(&self.0.derived[slot]),
            None => Err(ModelError::unknown(self.schema().name(), name)),
        }
    }

    /// Read a field and project it into `T`.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T, ModelError> {
        let value = self.get(name)?;

        T::from_value(value).ok_or_else(|| ModelError::TypeMismatch {
            schema: self.schema().name().to_string(),
            field: name.to_string(),
            expected: T::EXPECTED,
            actual: value.kind(),
        })
    }

    /// Every field (base and derived) in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.schema()
            .table()
            .slots()
            .map(|(name, slot)| match slot {
                Slot::Base(slot) => (name, &self.0.base[slot]),
                Slot::Derived(slot) => (name, &self.0.derived[slot]),
            })
    }

    /// Replace one base field.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<Self, ModelError> {
        let slot = self.schema().assignable_slot(name)?;

        self.replace_slot(slot, value.into())
    }

    /// Replace several base fields as one transition.
    ///
    /// Every name is validated before anything is built; the derived engine
    /// runs once, comparing this instance to the fully updated state.
    /// A repeated name keeps the last value.
    pub fn model_values<I, K, V>(&self, values: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let schema = self.schema();
        let mut base = self.0.base.to_vec();

        for (name, value) in values {
            let slot = schema.assignable_slot(name.as_ref())?;
            let value = value.into();
            schema.check_value(slot, &value)?;
            base[slot] = value;
        }

        Ok(Self::assemble(
            schema.clone(),
            base.into_boxed_slice(),
            Some(self),
        ))
    }

    /// Start a nested update rooted at this instance.
    #[must_use]
    pub fn deep_update(&self) -> DeepUpdate {
        DeepUpdate::new(self.clone())
    }

    /// Replace the field at the end of a resolved path, rebuilding every
    /// instance along the way.
    pub fn deep_set(&self, path: &KeyPath, value: impl Into<Value>) -> Result<Self, ModelError> {
        if !path.belongs_to(self.schema()) {
            return Err(ModelError::unknown(self.schema().name(), path.as_str()));
        }

        let Some((leaf, hops)) = path.slots().split_last() else {
            return Ok(self.clone());
        };

        hops.iter()
            .try_fold(self.deep_update(), |update, slot| update.step(*slot))?
            .set_slot(*leaf, value.into())
    }

    /// Whether both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn base_values(&self) -> &[Value] {
        &self.0.base
    }

    pub(crate) fn derived_value(&self, slot: usize) -> &Value {
        &self.0.derived[slot]
    }

    /// Single-slot transition shared by `set`, deep updates and path sets.
    pub(crate) fn replace_slot(&self, slot: usize, value: Value) -> Result<Self, ModelError> {
        self.schema().check_value(slot, &value)?;

        let mut base = self.0.base.to_vec();
        base[slot] = value;

        Ok(Self::assemble(
            self.schema().clone(),
            base.into_boxed_slice(),
            Some(self),
        ))
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.schema().ptr_eq(other.schema()) && self.0.base == other.0.base)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema().name());
        for (name, value) in self.entries() {
            out.field(name, value);
        }

        out.finish()
    }
}
