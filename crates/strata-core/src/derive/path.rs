use crate::model::{Schema, SchemaDef};
use std::{
    fmt,
    sync::{Arc, Weak},
};

///
/// KeyPath
///
/// A dotted field path resolved against a schema into base-slot indices.
/// Every hop before the last went through a nested-model field, so walking
/// the slots needs no name lookups.
///
/// Paths handed out by `Schema::key_path` remember the build they came
/// from; slot indices are only meaningful against that build.
///

#[derive(Clone)]
pub struct KeyPath {
    root: Arc<str>,
    path: Arc<str>,
    slots: Arc<[usize]>,
    owner: Option<Weak<SchemaDef>>,
}

impl KeyPath {
    pub(crate) const fn new(root: Arc<str>, path: Arc<str>, slots: Arc<[usize]>) -> Self {
        Self {
            root,
            path,
            slots,
            owner: None,
        }
    }

    pub(crate) fn owned_by(mut self, schema: &Schema) -> Self {
        self.owner = Some(schema.downgrade());
        self
    }

    /// Whether the path was resolved against this exact schema build.
    #[must_use]
    pub fn belongs_to(&self, schema: &Schema) -> bool {
        self.owner
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|owner| schema.is_def(&owner))
    }

    /// Name of the schema the path was resolved against.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Number of hops, including the final field.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slots(&self) -> &[usize] {
        &self.slots
    }
}

impl PartialEq for KeyPath {
    fn eq(&self, other: &Self) -> bool {
        let same_owner = match (&self.owner, &other.owner) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };

        same_owner && self.root == other.root && self.slots == other.slots
    }
}

impl Eq for KeyPath {}

impl fmt::Debug for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.root, self.path)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
