use crate::collection::CollectionError;
use indexmap::{Equivalent, IndexMap};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, hash::Hash, sync::Arc};

///
/// Map
///
/// Insertion-ordered immutable map.
///
/// - Iteration order is insertion order.
/// - `set` on an existing key replaces the value in its original position.
/// - `delete` keeps the relative order of the remaining entries.
/// - Values live behind `Arc` and are shared with the source map.
/// - Equality ignores order: same key set, pairwise-equal values.
///

pub struct Map<K, V> {
    entries: Arc<IndexMap<K, Arc<V>>>,
}

impl<K, V> Map<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(IndexMap::new()),
        }
    }

    fn from_entries(entries: IndexMap<K, Arc<V>>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.values().map(AsRef::as_ref)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v.as_ref()))
    }

    /// Visit every entry as `(value, key)`.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&V, &K),
    {
        for (k, v) in self.iter() {
            f(v, k);
        }
    }

    /// Whether both maps share the same backing storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<K, V> Map<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Build a map from `(key, value)` pairs; a repeated key keeps its first
    /// position and the last value.
    pub fn create<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        entries.into_iter().collect()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.get(key).map(AsRef::as_ref)
    }

    /// Return the value for `key`, or `default` when absent.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.get(key).unwrap_or(default)
    }

    /// Return the value for `key`, failing when absent.
    pub fn force_get<Q>(&self, key: &Q) -> Result<&V, CollectionError>
    where
        Q: ?Sized + Hash + Equivalent<K> + fmt::Debug,
    {
        self.get(key).ok_or_else(|| CollectionError::KeyNotFound {
            key: format!("{key:?}"),
        })
    }

    pub fn has<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.entries.contains_key(key)
    }

    /// Insert or replace `key`, returning the updated map.
    #[must_use]
    pub fn set(&self, key: K, value: V) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(key, Arc::new(value));

        Self::from_entries(entries)
    }

    /// Remove `key`, returning the updated map.
    /// A missing key yields a map sharing this map's storage.
    #[must_use]
    pub fn delete<Q>(&self, key: &Q) -> Self
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        if !self.entries.contains_key(key) {
            return self.clone();
        }

        let mut entries = (*self.entries).clone();
        entries.shift_remove(key);

        Self::from_entries(entries)
    }

    /// Map every value, keeping keys and order.
    #[must_use]
    pub fn map<U, F>(&self, mut f: F) -> Map<K, U>
    where
        F: FnMut(&V, &K) -> U,
    {
        self.iter().map(|(k, v)| (k.clone(), f(v, k))).collect()
    }

    /// Keep the entries matching `predicate`, in order.
    #[must_use]
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&V, &K) -> bool,
    {
        let entries = self
            .entries
            .iter()
            .filter(|(k, v)| predicate(&***v, *k))
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();

        Self::from_entries(entries)
    }
}

impl<K, V> Map<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Plain keyed snapshot in insertion order.
    #[must_use]
    pub fn object_view(&self) -> IndexMap<K, V> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K, V> Clone for Map<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K, V> Default for Map<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Map<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> PartialEq for Map<K, V>
where
    K: Clone + Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.size() == other.size()
                && self.iter().all(|(k, v)| other.get(k).is_some_and(|o| o == v)))
    }
}

impl<K, V> FromIterator<(K, V)> for Map<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(
            iter.into_iter()
                .map(|(k, v)| (k, Arc::new(v)))
                .collect(),
        )
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Map<K, V>
where
    K: Eq + Hash,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V> From<IndexMap<K, V>> for Map<K, V>
where
    K: Eq + Hash,
{
    fn from(entries: IndexMap<K, V>) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Serialize, V: Serialize> Serialize for Map<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, K, V> Deserialize<'de> for Map<K, V>
where
    K: Deserialize<'de> + Eq + Hash,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IndexMap::<K, V>::deserialize(deserializer).map(Self::from)
    }
}

///
/// TESTS
///
