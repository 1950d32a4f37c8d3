use crate::{
    model::{Model, ModelError},
    value::Value,
};
use tracing::trace;

///
/// DeepUpdate
///
/// Nested update builder. Each `field` step descends into a base field
/// holding a nested instance; the terminal call applies the leaf change and
/// rebuilds exactly the chain of ancestors, each through its own
/// single-field transition.
///

#[derive(Clone, Debug)]
pub struct DeepUpdate {
    ancestors: Vec<(Model, usize)>,
    current: Model,
}

impl DeepUpdate {
    pub(crate) const fn new(root: Model) -> Self {
        Self {
            ancestors: Vec::new(),
            current: root,
        }
    }

    /// Instance the next step or terminal call applies to.
    #[must_use]
    pub const fn current(&self) -> &Model {
        &self.current
    }

    /// Number of steps taken from the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    /// Descend into the nested instance held by `name`.
    pub fn field(self, name: &str) -> Result<Self, ModelError> {
        let slot = self.current.schema().assignable_slot(name)?;

        self.step(slot)
    }

    /// Replace one field of the current instance and rebuild the ancestors.
    pub fn set(self, name: &str, value: impl Into<Value>) -> Result<Model, ModelError> {
        let leaf = self.current.set(name, value)?;

        self.rebuild(leaf)
    }

    /// Replace several fields of the current instance as one transition and
    /// rebuild the ancestors.
    pub fn model_values<I, K, V>(self, values: I) -> Result<Model, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let leaf = self.current.model_values(values)?;

        self.rebuild(leaf)
    }

    /// Replace the current instance with whatever `f` builds from it.
    ///
    /// The replacement must be an instance of the same schema, or the
    /// parent's shape check rejects it.
    pub fn update<F>(self, f: F) -> Result<Model, ModelError>
    where
        F: FnOnce(&Model) -> Result<Model, ModelError>,
    {
        let leaf = f(&self.current)?;

        self.rebuild(leaf)
    }

    pub(crate) fn step(mut self, slot: usize) -> Result<Self, ModelError> {
        let schema = self.current.schema();
        let Some(Value::Model(child)) = self.current.base_values().get(slot) else {
            return Err(ModelError::not_nested(schema.name(), schema.base_name(slot)));
        };

        let child = child.clone();
        let parent = std::mem::replace(&mut self.current, child);
        self.ancestors.push((parent, slot));

        Ok(self)
    }

    pub(crate) fn set_slot(self, slot: usize, value: Value) -> Result<Model, ModelError> {
        let leaf = self.current.replace_slot(slot, value)?;

        self.rebuild(leaf)
    }

    fn rebuild(self, leaf: Model) -> Result<Model, ModelError> {
        self.ancestors
            .into_iter()
            .rev()
            .try_fold(leaf, |child, (parent, slot)| {
                trace!(
                    schema = %parent.schema().name(),
                    field = %parent.schema().base_name(slot),
                    "rebuilding ancestor"
                );
                parent.replace_slot(slot, Value::Model(child))
            })
    }
}
