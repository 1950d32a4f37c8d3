use crate::{
    derive::{Compute, Dependency, DerivedField, KeyPath},
    model::{Model, ModelError},
    value::Value,
};
use derive_more::Deref;
use indexmap::IndexMap;
use std::{
    fmt,
    sync::{Arc, Weak},
};
use tracing::debug;

///
/// Shape
///
/// Declared kind of a base field's value.
///
/// Any        → plain data (scalars, lists and maps of plain data).
/// Model      → a nested instance of the given schema, or null.
/// ListOf     → a list whose every element is an instance of the schema.
/// MapOf      → a text-keyed map of instances of the schema.
/// Reference  → a nested instance carried over the wire as its key field.
///

#[derive(Clone, Debug, Default)]
pub enum Shape {
    #[default]
    Any,
    Model(Schema),
    ListOf(Schema),
    MapOf(Schema),
    Reference { schema: Schema, key: Arc<str> },
}

impl Shape {
    pub fn reference(schema: Schema, key: impl Into<Arc<str>>) -> Self {
        Self::Reference {
            schema,
            key: key.into(),
        }
    }

    /// Nested schema a key path may step through.
    #[must_use]
    pub const fn nested(&self) -> Option<&Schema> {
        match self {
            Self::Model(schema) | Self::Reference { schema, .. } => Some(schema),
            _ => None,
        }
    }

    #[must_use]
    pub const fn expected(&self) -> &'static str {
        match self {
            Self::Any => "plain value",
            Self::Model(_) | Self::Reference { .. } => "model",
            Self::ListOf(_) => "list of models",
            Self::MapOf(_) => "map of models",
        }
    }

    /// Whether `value` fits this shape. Null fits every shape.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        let instance_of = |value: &Value, schema: &Schema| {
            value.as_model().is_some_and(|m| m.schema().ptr_eq(schema))
        };

        match (self, value) {
            (_, Value::Null) => true,
            (Self::Any, value) => !value.contains_model(),
            (Self::Model(schema) | Self::Reference { schema, .. }, value) => {
                instance_of(value, schema)
            }
            (Self::ListOf(schema), Value::List(items)) => {
                items.every(|item| instance_of(item, schema))
            }
            (Self::MapOf(schema), Value::Map(entries)) => {
                entries.values().all(|item| instance_of(item, schema))
            }
            _ => false,
        }
    }
}

///
/// Slot
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Slot {
    Base(usize),
    Derived(usize),
}

///
/// BaseField
/// `default: None` marks a required field.
///

#[derive(Clone, Debug)]
pub(crate) struct BaseField {
    pub(crate) name: Arc<str>,
    pub(crate) default: Option<Value>,
    pub(crate) shape: Shape,
}

///
/// FieldTable
///
/// Name → slot index, plus the ordered base declarations.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct FieldTable {
    index: IndexMap<Arc<str>, Slot>,
    base: Vec<BaseField>,
}

impl FieldTable {
    pub(crate) fn slot(&self, name: &str) -> Option<Slot> {
        self.index.get(name).copied()
    }

    pub(crate) fn base(&self) -> &[BaseField] {
        &self.base
    }

    /// Every field with its slot, in declaration order.
    pub(crate) fn slots(&self) -> impl Iterator<Item = (&str, Slot)> + '_ {
        self.index.iter().map(|(name, slot)| (name.as_ref(), *slot))
    }

    /// Slot of an assignable (base) field.
    pub(crate) fn base_slot(&self, schema: &str, name: &str) -> Result<usize, ModelError> {
        match self.slot(name) {
            Some(Slot::Base(slot)) => Ok(slot),
            Some(Slot::Derived(_)) => Err(ModelError::derived(schema, name)),
            None => Err(ModelError::unknown(schema, name)),
        }
    }

    /// Resolve a dotted path into base-slot indices, stepping through
    /// nested-model fields.
    pub(crate) fn resolve_path(
        &self,
        root: &Arc<str>,
        path: &str,
    ) -> Result<KeyPath, ModelError> {
        let mut table = self;
        let mut owner: &str = root;
        let mut slots = Vec::new();
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let slot = table.base_slot(owner, segment)?;
            slots.push(slot);

            if segments.peek().is_some() {
                let Some(nested) = table.base[slot].shape.nested() else {
                    return Err(ModelError::not_nested(owner, segment));
                };
                table = &nested.table;
                owner = nested.name();
            }
        }

        Ok(KeyPath::new(Arc::clone(root), path.into(), slots.into()))
    }
}

///
/// SchemaDef
///
/// The shared descriptor behind a `Schema` handle.
///

#[derive(Debug)]
pub struct SchemaDef {
    name: Arc<str>,
    table: FieldTable,
    derived: Vec<DerivedField>,
}

impl SchemaDef {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All field names (base and derived) in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.table.index.keys().map(AsRef::as_ref)
    }

    pub fn base_field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.table.base.iter().map(|field| field.name.as_ref())
    }

    pub fn derived_field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.derived.iter().map(|field| field.name.as_ref())
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.table.slot(name).is_some()
    }

    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.base_field(name).is_some_and(|field| field.default.is_none())
    }

    #[must_use]
    pub fn is_derived(&self, name: &str) -> bool {
        matches!(self.table.slot(name), Some(Slot::Derived(_)))
    }

    #[must_use]
    pub fn default_value(&self, name: &str) -> Option<&Value> {
        self.base_field(name).and_then(|field| field.default.as_ref())
    }

    #[must_use]
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.base_field(name).map(|field| &field.shape)
    }

    /// Whether decoding an instance needs an async resolver.
    #[must_use]
    pub fn has_references(&self) -> bool {
        self.table
            .base
            .iter()
            .any(|field| matches!(field.shape, Shape::Reference { .. }))
    }

    fn base_field(&self, name: &str) -> Option<&BaseField> {
        match self.table.slot(name)? {
            Slot::Base(slot) => self.table.base.get(slot),
            Slot::Derived(_) => None,
        }
    }

    pub(crate) const fn table(&self) -> &FieldTable {
        &self.table
    }

    pub(crate) fn derived(&self) -> &[DerivedField] {
        &self.derived
    }

    pub(crate) fn assignable_slot(&self, name: &str) -> Result<usize, ModelError> {
        self.table.base_slot(&self.name, name)
    }

    pub(crate) fn assignable_shape(&self, name: &str) -> Result<&Shape, ModelError> {
        let slot = self.assignable_slot(name)?;

        self.table
            .base
            .get(slot)
            .map(|field| &field.shape)
            .ok_or_else(|| ModelError::unknown(&self.name, name))
    }

    pub(crate) fn base_name(&self, slot: usize) -> &str {
        self.table.base.get(slot).map_or("", |field| field.name.as_ref())
    }

    /// Shape check for a value about to land in `slot`.
    pub(crate) fn check_value(&self, slot: usize, value: &Value) -> Result<(), ModelError> {
        let Some(field) = self.table.base.get(slot) else {
            return Err(ModelError::unknown(&self.name, &format!("#{slot}")));
        };

        if field.shape.accepts(value) {
            Ok(())
        } else {
            Err(ModelError::TypeMismatch {
                schema: self.name.to_string(),
                field: field.name.to_string(),
                expected: field.shape.expected(),
                actual: value.kind(),
            })
        }
    }
}

///
/// Schema
///
/// Cheap, shareable handle to a built `SchemaDef`.
/// Two handles are the same schema only if they point at the same build.
///

#[derive(Clone, Deref)]
#[deref(forward)]
pub struct Schema(Arc<SchemaDef>);

impl Schema {
    pub fn builder(name: impl Into<Arc<str>>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> Weak<SchemaDef> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn is_def(&self, def: &Arc<SchemaDef>) -> bool {
        Arc::ptr_eq(&self.0, def)
    }

    /// Construct an instance from `(name, value)` pairs.
    ///
    /// Absent default fields take the schema default; the first absent
    /// required field (in declaration order) fails the construction.
    pub fn create<I, K, V>(&self, values: I) -> Result<Model, ModelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut provided: Vec<Option<Value>> = vec![None; self.table.base.len()];

        for (name, value) in values {
            let slot = self.assignable_slot(name.as_ref())?;
            let value = value.into();
            self.check_value(slot, &value)?;
            provided[slot] = Some(value);
        }

        let base = self
            .table
            .base
            .iter()
            .zip(provided)
            .map(|(field, value)| {
                value
                    .or_else(|| field.default.clone())
                    .ok_or_else(|| ModelError::missing(&self.name, &field.name))
            })
            .collect::<Result<Box<[Value]>, _>>()?;

        Ok(Model::assemble(self.clone(), base, None))
    }

    /// Resolve a dotted path against this schema.
    pub fn key_path(&self, path: &str) -> Result<KeyPath, ModelError> {
        self.table
            .resolve_path(&self.name, path)
            .map(|resolved| resolved.owned_by(self))
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name())
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .finish()
    }
}

///
/// SchemaBuilder
///
/// Ordered field declarations. Base and derived fields may be interleaved;
/// declaration order is the order of `field_names` and of serialization.
///

#[derive(Debug)]
pub struct SchemaBuilder {
    name: Arc<str>,
    entries: Vec<Entry>,
}

#[derive(Debug)]
enum Entry {
    Base(BaseField),
    Derived {
        name: Arc<str>,
        dependency: Dependency,
        compute: Compute,
    },
}

impl Entry {
    const fn name(&self) -> &Arc<str> {
        match self {
            Self::Base(field) => &field.name,
            Self::Derived { name, .. } => name,
        }
    }
}

impl SchemaBuilder {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn required(self, name: impl Into<Arc<str>>) -> Self {
        self.required_shaped(name, Shape::Any)
    }

    #[must_use]
    pub fn required_shaped(self, name: impl Into<Arc<str>>, shape: Shape) -> Self {
        self.base(name.into(), None, shape)
    }

    #[must_use]
    pub fn default(self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.default_shaped(name, value, Shape::Any)
    }

    #[must_use]
    pub fn default_shaped(
        self,
        name: impl Into<Arc<str>>,
        value: impl Into<Value>,
        shape: Shape,
    ) -> Self {
        self.base(name.into(), Some(value.into()), shape)
    }

    #[must_use]
    pub fn derived(
        mut self,
        name: impl Into<Arc<str>>,
        dependency: Dependency,
        compute: Compute,
    ) -> Self {
        self.entries.push(Entry::Derived {
            name: name.into(),
            dependency,
            compute,
        });
        self
    }

    fn base(mut self, name: Arc<str>, default: Option<Value>, shape: Shape) -> Self {
        self.entries.push(Entry::Base(BaseField {
            name,
            default,
            shape,
        }));
        self
    }

    /// Validate the declarations and resolve every dependency path.
    pub fn build(self) -> Result<Schema, ModelError> {
        let Self { name, entries } = self;
        let mut table = FieldTable::default();
        let mut pending = Vec::new();

        for entry in entries {
            let slot = match &entry {
                Entry::Base(_) => Slot::Base(table.base.len()),
                Entry::Derived { .. } => Slot::Derived(pending.len()),
            };
            if table.index.insert(Arc::clone(entry.name()), slot).is_some() {
                return Err(ModelError::DuplicateField {
                    schema: name.to_string(),
                    field: entry.name().to_string(),
                });
            }

            match entry {
                Entry::Base(field) => {
                    validate_base(&name, &field)?;
                    table.base.push(field);
                }
                Entry::Derived {
                    name: field,
                    dependency,
                    compute,
                } => pending.push((field, dependency, compute)),
            }
        }

        // paths are resolved only once every field is known
        let derived = pending
            .into_iter()
            .map(|(field, dependency, compute)| {
                Ok(DerivedField {
                    trigger: dependency.resolve(&name, &table)?,
                    name: field,
                    compute,
                })
            })
            .collect::<Result<Vec<_>, ModelError>>()?;

        debug!(
            schema = %name,
            base = table.base.len(),
            derived = derived.len(),
            "built schema"
        );

        Ok(Schema(Arc::new(SchemaDef {
            name,
            table,
            derived,
        })))
    }
}

fn validate_base(schema: &str, field: &BaseField) -> Result<(), ModelError> {
    if let Some(default) = &field.default
        && !field.shape.accepts(default)
    {
        return Err(ModelError::TypeMismatch {
            schema: schema.to_string(),
            field: field.name.to_string(),
            expected: field.shape.expected(),
            actual: default.kind(),
        });
    }

    if let Shape::Reference { schema: target, key } = &field.shape {
        target.assignable_slot(key)?;
    }

    Ok(())
}
