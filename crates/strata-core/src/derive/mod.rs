//! Derived-value computation.
//!
//! A derived field pairs a [`Dependency`] (when to recompute) with a
//! [`Compute`] (how to produce the value). Dependencies are declarations:
//! `has_changed` paths are resolved against the schema when it is built and
//! evaluated afterwards through slot indices only.
//!
//! Derived fields read base fields only, so recomputation is a single pass
//! over the derived list with no dependency graph.

mod engine;
mod path;

pub(crate) use engine::derive_values;
pub use path::KeyPath;

use crate::{
    model::{Fields, FieldTable, Model, ModelError},
    value::Value,
};
use std::{fmt, sync::Arc};

type PredicateFn = dyn Fn(&Fields<'_>, &Fields<'_>) -> bool + Send + Sync;
type ComputeFn = dyn Fn(&Fields<'_>, Option<&Model>) -> Value + Send + Sync;

///
/// Dependency
///
/// Declares when a derived field must be recomputed across a transition
/// `prev -> next`. Evaluated only for mutations; the first construction
/// always computes.
///

#[derive(Clone)]
pub struct Dependency(DependencyKind);

#[derive(Clone)]
enum DependencyKind {
    Always,
    Never,
    Changed(Vec<Arc<str>>),
    Custom(Arc<PredicateFn>),
}

impl Dependency {
    /// Recompute on every transition.
    #[must_use]
    pub const fn always() -> Self {
        Self(DependencyKind::Always)
    }

    /// Compute once at construction and carry the value forever after.
    #[must_use]
    pub const fn never() -> Self {
        Self(DependencyKind::Never)
    }

    /// Recompute when any dotted key path resolves to a different value.
    pub fn has_changed<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Arc<str>>,
    {
        Self(DependencyKind::Changed(
            paths.into_iter().map(Into::into).collect(),
        ))
    }

    /// Recompute when `predicate(prev, next)` returns `true`.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Fields<'_>, &Fields<'_>) -> bool + Send + Sync + 'static,
    {
        Self(DependencyKind::Custom(Arc::new(predicate)))
    }

    /// Recompute when the key extracted from the base fields changes.
    pub fn key<K, F>(key: F) -> Self
    where
        K: PartialEq,
        F: Fn(&Fields<'_>) -> K + Send + Sync + 'static,
    {
        Self::custom(move |prev, next| key(prev) != key(next))
    }

    /// Resolve declared paths against the owning schema's field table.
    pub(crate) fn resolve(
        self,
        schema: &Arc<str>,
        table: &FieldTable,
    ) -> Result<Trigger, ModelError> {
        Ok(match self.0 {
            DependencyKind::Always => Trigger::Always,
            DependencyKind::Never => Trigger::Never,
            DependencyKind::Changed(paths) => Trigger::Paths(
                paths
                    .iter()
                    .map(|path| table.resolve_path(schema, path))
                    .collect::<Result<_, _>>()?,
            ),
            DependencyKind::Custom(predicate) => Trigger::Custom(predicate),
        })
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            DependencyKind::Always => f.write_str("Always"),
            DependencyKind::Never => f.write_str("Never"),
            DependencyKind::Changed(paths) => f.debug_tuple("HasChanged").field(paths).finish(),
            DependencyKind::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Predicate factory: recompute when any of `paths` changed.
///
/// Each path is a dotted chain of base field names (`"user.role.name"`);
/// every hop before the last must go through a field declared with a
/// nested-model shape.
pub fn has_changed<I, P>(paths: I) -> Dependency
where
    I: IntoIterator<Item = P>,
    P: Into<Arc<str>>,
{
    Dependency::has_changed(paths)
}

///
/// Trigger
///
/// Resolved dependency stored on the schema.
///

#[derive(Clone)]
pub(crate) enum Trigger {
    Always,
    Never,
    Paths(Vec<KeyPath>),
    Custom(Arc<PredicateFn>),
}

impl Trigger {
    pub(crate) fn fires(&self, prev: &Fields<'_>, next: &Fields<'_>) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Paths(paths) => paths.iter().any(|path| {
                match (prev.resolve(path), next.resolve(path)) {
                    (Some(before), Some(after)) => !before.same(after),
                    (None, None) => false,
                    _ => true,
                }
            }),
            Self::Custom(predicate) => predicate(prev, next),
        }
    }
}

///
/// Compute
///
/// Produces a derived value from the next base state. A stateful compute
/// also receives the immediately preceding instance; it never sees deeper
/// history.
///

#[derive(Clone)]
pub struct Compute {
    func: Arc<ComputeFn>,
    stateful: bool,
}

impl Compute {
    #[must_use]
    pub const fn is_stateful(&self) -> bool {
        self.stateful
    }

    pub(crate) fn run(&self, next: &Fields<'_>, prev: Option<&Model>) -> Value {
        (self.func)(next, prev.filter(|_| self.stateful))
    }
}

impl fmt::Debug for Compute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compute")
            .field("stateful", &self.stateful)
            .finish_non_exhaustive()
    }
}

/// Pure compute: the result depends on the next base fields alone.
pub fn compute<F, V>(func: F) -> Compute
where
    F: Fn(&Fields<'_>) -> V + Send + Sync + 'static,
    V: Into<Value>,
{
    Compute {
        func: Arc::new(move |next, _| func(next).into()),
        stateful: false,
    }
}

/// Stateful compute: also receives the previous instance (absent on the
/// first construction).
pub fn stateful_compute<F, V>(func: F) -> Compute
where
    F: Fn(&Fields<'_>, Option<&Model>) -> V + Send + Sync + 'static,
    V: Into<Value>,
{
    Compute {
        func: Arc::new(move |next, prev| func(next, prev).into()),
        stateful: true,
    }
}

///
/// DerivedField
///

#[derive(Clone, Debug)]
pub(crate) struct DerivedField {
    pub(crate) name: Arc<str>,
    pub(crate) trigger: Trigger,
    pub(crate) compute: Compute,
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::Paths(paths) => f.debug_tuple("Paths").field(paths).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}
